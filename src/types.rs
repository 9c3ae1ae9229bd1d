//! Typed projections of service and package state
//!
//! Every value here is rebuilt from the live system on each query. Nothing in
//! this module is cached or persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A named unit managed by the service manager (e.g. `snapd.socket`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceDescriptor {
    pub name: String,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Enablement state as reported by `systemctl is-enabled`.
///
/// `Static`, `Indirect` and `Masked` cannot be changed by a plain
/// enable/disable and are kept apart from `Disabled` on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnabledState {
    Enabled,
    Disabled,
    Static,
    Indirect,
    Masked,
    /// The query failed or produced no output.
    Unknown,
    /// Any other word the service manager printed, kept verbatim.
    Other(String),
}

impl EnabledState {
    /// States for which a disable call is unnecessary (or bound to fail).
    pub fn is_already_disabled(&self) -> bool {
        matches!(
            self,
            Self::Disabled | Self::Static | Self::Indirect | Self::Masked
        )
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl FromStr for EnabledState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" => Self::Unknown,
            "enabled" | "enabled-runtime" => Self::Enabled,
            "disabled" => Self::Disabled,
            "static" => Self::Static,
            "indirect" => Self::Indirect,
            "masked" | "masked-runtime" => Self::Masked,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for EnabledState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
            Self::Static => write!(f, "static"),
            Self::Indirect => write!(f, "indirect"),
            Self::Masked => write!(f, "masked"),
            Self::Unknown => write!(f, "unknown"),
            Self::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Fresh snapshot of one unit. `active` is `None` when the query failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceState {
    pub active: Option<bool>,
    pub enabled: EnabledState,
}

impl ServiceState {
    pub fn is_active(&self) -> bool {
        self.active == Some(true)
    }
}

/// Release track a snap is installed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Stable,
    Candidate,
    Beta,
    Edge,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// One row of a catalog search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSearchResult {
    pub name: String,
    pub version: String,
    pub publisher: String,
    pub channel: String,
    /// Notes column (`-`, `classic`, ...); empty when the format has none.
    pub notes: String,
    pub summary: String,
}

impl PackageSearchResult {
    /// Whether the catalog flags this package as needing classic confinement.
    pub fn wants_classic(&self) -> bool {
        self.notes.split(',').any(|n| n.trim() == "classic")
    }
}

/// One row of `snap list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub revision: String,
    pub tracking_channel: String,
    pub publisher: String,
    pub notes: String,
}

/// Parameters of a single install attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub package_name: String,
    pub channel: Channel,
    pub classic_confinement: bool,
}

impl InstallRequest {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            channel: Channel::default(),
            classic_confinement: false,
        }
    }

    /// Arguments for `snap install`.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            self.package_name.clone(),
            format!("--channel={}", self.channel),
        ];
        if self.classic_confinement {
            args.push("--classic".to_string());
        }
        args
    }
}

/// Mutating verbs understood by the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum UnitAction {
    Enable,
    Disable,
    Start,
    Stop,
    Unmask,
    DaemonReload,
}

impl UnitAction {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// `daemon-reload` is manager-wide and takes no unit argument.
    pub fn takes_unit(&self) -> bool {
        !matches!(self, Self::DaemonReload)
    }
}
