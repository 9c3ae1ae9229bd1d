//! Configuration management module
//!
//! All settings have built-in defaults. An optional JSON file overrides them
//! field by field; it is located via `--config`, then `$SNAPMENU_CONFIG`.
//! The loaded value is immutable for the rest of the run.

use crate::error::{Result, SnapMenuError};
use crate::normalizer::DEFAULT_SEARCH_LIMIT;
use crate::types::ServiceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "SNAPMENU_CONFIG";

/// Where the launcher is installed by default.
pub const DEFAULT_LAUNCHER_PATH: &str = "/usr/local/bin/snapmenu";

/// Largest accepted `search_limit`.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Units shown in the service manager, in display order.
    pub services: Vec<ServiceDescriptor>,
    /// Maximum number of search rows displayed.
    pub search_limit: usize,
    /// Install target for the launcher.
    pub launcher_path: PathBuf,
    /// Package tool binary.
    pub snap_binary: String,
    /// Service manager binary.
    pub systemctl_binary: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            services: vec![
                ServiceDescriptor::new("snapd.service"),
                ServiceDescriptor::new("snapd.socket"),
            ],
            search_limit: DEFAULT_SEARCH_LIMIT,
            launcher_path: PathBuf::from(DEFAULT_LAUNCHER_PATH),
            snap_binary: "snap".to_string(),
            systemctl_binary: "systemctl".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate a configuration file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SnapMenuError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the configuration for this run.
    ///
    /// `explicit` (from `--config`) wins over `$SNAPMENU_CONFIG`; with neither,
    /// defaults are used.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from_file(path),
            None => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save configuration to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(SnapMenuError::config("services must not be empty"));
        }
        let mut seen = HashSet::new();
        for service in &self.services {
            let name = service.name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) || name.starts_with('-') {
                return Err(SnapMenuError::config(format!(
                    "invalid service name {:?}",
                    service.name
                )));
            }
            if !seen.insert(name) {
                return Err(SnapMenuError::config(format!(
                    "duplicate service {:?}",
                    service.name
                )));
            }
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&self.search_limit) {
            return Err(SnapMenuError::config(format!(
                "search_limit must be between 1 and {}, got {}",
                MAX_SEARCH_LIMIT, self.search_limit
            )));
        }
        if !self.launcher_path.is_absolute() {
            return Err(SnapMenuError::config(format!(
                "launcher_path must be absolute, got {}",
                self.launcher_path.display()
            )));
        }
        if self.snap_binary.trim().is_empty() || self.systemctl_binary.trim().is_empty() {
            return Err(SnapMenuError::config("tool binaries must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.search_limit, 30);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "search_limit": 25 }"#).unwrap();
        assert_eq!(config.search_limit, 25);
        assert_eq!(config.snap_binary, "snap");
        assert_eq!(config.services[1].name, "snapd.socket");
    }

    #[test]
    fn test_services_deserialize_as_strings() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "services": ["snapd.socket", "snapd.apparmor.service"] }"#)
                .unwrap();
        assert_eq!(config.services[1], ServiceDescriptor::new("snapd.apparmor.service"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(serde_json::from_str::<AppConfig>(r#"{ "colour": "red" }"#).is_err());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.search_limit = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.services.push(ServiceDescriptor::new("snapd.socket"));
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.services.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.launcher_path = PathBuf::from("bin/snapmenu");
        assert!(config.validate().is_err());
    }
}
