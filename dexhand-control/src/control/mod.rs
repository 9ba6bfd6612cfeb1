//! The hand control core: coordinator, preset sequencer, and telemetry
//! poller, plus the status feed types shared with the presentation
//! layer.

mod coordinator;
mod sequencer;
mod telemetry;

pub use coordinator::{HandCoordinator, RunState};
pub use sequencer::PresetSequencer;
pub use telemetry::TelemetryPoller;

use dexhand_common::{Error, Severity};

/// One entry on the operator-facing status feed.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub severity: Severity,
    pub message: String,
}

impl StatusEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// Status entry for a failed operation, severity taken from the
    /// error kind.
    pub fn from_error(error: &Error) -> Self {
        Self {
            severity: error.severity(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_error_severity() {
        let event = StatusEvent::from_error(&Error::Adapter("bus down".into()));
        assert_eq!(event.severity, Severity::Error);
        assert!(event.message.contains("bus down"));

        let event = StatusEvent::from_error(&Error::Validation("length".into()));
        assert_eq!(event.severity, Severity::Warning);
    }
}
