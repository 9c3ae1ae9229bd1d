//! Error handling module for snapmenu
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Library code returns these; the binary wraps them with anyhow context.

use thiserror::Error;

/// Main error type for snapmenu
#[derive(Error, Debug)]
pub enum SnapMenuError {
    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external command ran and reported failure
    #[error("`{command}` failed (exit code {code}): {diagnostic}")]
    CommandFailed {
        command: String,
        code: i32,
        diagnostic: String,
    },

    /// A required external tool is not present on this system
    #[error("Required tool not available: {0}")]
    Unavailable(String),

    /// No supported OS package manager could install a dependency
    #[error("Unsupported package manager: {0}")]
    UnsupportedPackageManager(String),

    /// Query output could not be interpreted
    #[error("Query failed: {0}")]
    Query(String),

    /// Validation errors (user input, config values)
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for snapmenu operations
pub type Result<T> = std::result::Result<T, SnapMenuError>;

impl SnapMenuError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unavailable-dependency error
    pub fn unavailable(tool: impl Into<String>) -> Self {
        Self::Unavailable(tool.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Raw diagnostic text of a failed command, or the rendered error otherwise.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::CommandFailed { diagnostic, .. } => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}
