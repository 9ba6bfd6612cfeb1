//! Error types for the dexhand services.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the dexhand error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for dexhand services.
#[derive(Error, Debug)]
pub enum Error {
    /// Settings file unreadable or descriptor invalid. Fatal at startup;
    /// never produced after initialization.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A driver call failed or timed out. Recovered locally: the
    /// publisher and setters report and continue, the poller substitutes
    /// a zero frame.
    #[error("Driver error: {0}")]
    Adapter(String),

    /// A requested vector or preset does not match the resolved joint
    /// count. Rejected before any driver call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation is not available in the current configuration,
    /// e.g. cycling with an empty preset set.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this is a configuration error.
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a driver-level error.
    pub const fn is_adapter(&self) -> bool {
        matches!(self, Self::Adapter(_))
    }

    /// Status-feed severity for this error.
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Validation(_) | Self::Unsupported(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Severity of a status-feed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Get the severity label used in status messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        assert_eq!(
            Error::Validation("bad length".into()).severity(),
            Severity::Warning
        );
        assert_eq!(
            Error::Unsupported("no presets".into()).severity(),
            Severity::Warning
        );
        assert_eq!(Error::Adapter("bus down".into()).severity(), Severity::Error);
        assert_eq!(Error::Config("missing".into()).severity(), Severity::Error);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Info.label(), "info");
        assert_eq!(Severity::Warning.label(), "warning");
        assert_eq!(Severity::Error.label(), "error");
    }

    #[test]
    fn test_error_kind_checks() {
        assert!(Error::Config("x".into()).is_config());
        assert!(Error::Adapter("x".into()).is_adapter());
        assert!(!Error::Validation("x".into()).is_adapter());
    }
}
