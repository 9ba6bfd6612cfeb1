//! Configuration management for the dexhand services.
//!
//! Settings live in a single JSON file at `~/.dexhand/config.json`
//! (overridable via the `DEXHAND_CONFIG` environment variable). A
//! missing file yields the defaults; an unreadable or malformed file is
//! a fatal configuration error at startup.
//!
//! The file describes which hand is installed (left, right, or both;
//! the control service drives exactly one, left taking precedence),
//! the joint model, touch capability, and the bus the driver uses.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".dexhand"),
        |dirs| dirs.home_dir().join(".dexhand"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    match std::env::var("DEXHAND_CONFIG") {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("config.json"),
    }
}

// ============================================================================
// Hand settings (persisted descriptor)
// ============================================================================

/// Persisted settings for one hand slot (left or right).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandSlot {
    /// Whether a hand is installed in this slot.
    #[serde(default)]
    pub exists: bool,

    /// Joint model identifier (e.g. "O6", "L6", "L7", "L10").
    #[serde(default = "default_joint_model")]
    pub joint: String,

    /// Whether the hand carries capacitive touch pads.
    #[serde(default)]
    pub touch: bool,

    /// CAN channel the driver binds to.
    #[serde(default)]
    pub can: Option<String>,

    /// Modbus port, used instead of CAN when set.
    #[serde(default)]
    pub modbus: Option<String>,
}

fn default_joint_model() -> String {
    "L10".to_string()
}

impl Default for HandSlot {
    fn default() -> Self {
        Self {
            exists: false,
            joint: default_joint_model(),
            touch: false,
            can: None,
            modbus: None,
        }
    }
}

/// Persisted settings for both hand slots.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HandSettings {
    /// Left hand slot
    #[serde(default)]
    pub left_hand: HandSlot,

    /// Right hand slot
    #[serde(default)]
    pub right_hand: HandSlot,
}

// ============================================================================
// Resolved descriptor
// ============================================================================

/// Which side the active hand is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    /// Get the side label used in logs and status messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Bus the driver connects through. Opaque to the control core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusConfig {
    /// CAN channel name (e.g. "can0")
    Can(String),
    /// Modbus serial port (e.g. "/dev/ttyUSB0")
    Modbus(String),
}

/// The resolved hand descriptor the coordinator is built from.
///
/// Created once at startup and immutable for the coordinator's
/// lifetime. Exactly one side is active; when both slots are marked
/// present, left takes precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandDescriptor {
    /// Active side
    pub side: HandSide,
    /// Joint model identifier
    pub model: String,
    /// Whether matrix telemetry is available
    pub touch_capable: bool,
    /// Bus the driver binds to
    pub bus: BusConfig,
}

impl HandSlot {
    fn resolve(&self, side: HandSide) -> HandDescriptor {
        let bus = match &self.modbus {
            Some(port) if !port.is_empty() => BusConfig::Modbus(port.clone()),
            _ => BusConfig::Can(
                self.can
                    .clone()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| "can0".to_string()),
            ),
        };
        HandDescriptor {
            side,
            model: self.joint.clone(),
            touch_capable: self.touch,
            bus,
        }
    }
}

// ============================================================================
// Control and observability settings
// ============================================================================

/// Cadence and timeout settings for the control loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlSettings {
    /// Joint publish interval in milliseconds.
    ///
    /// 30 ms (~33 Hz). The original controller documented "10 Hz" next
    /// to a 30 ms constant; the constant wins here.
    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,

    /// Matrix telemetry poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Dwell between preset advances while cycling, in milliseconds.
    #[serde(default = "default_dwell_interval_ms")]
    pub dwell_interval_ms: u64,

    /// Upper bound on any single driver call, in milliseconds.
    /// A timeout is reported as a transient driver error instead of
    /// stalling the loop.
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,
}

fn default_publish_interval_ms() -> u64 {
    30
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_dwell_interval_ms() -> u64 {
    1000
}
fn default_adapter_timeout_ms() -> u64 {
    1000
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            publish_interval_ms: default_publish_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            dwell_interval_ms: default_dwell_interval_ms(),
            adapter_timeout_ms: default_adapter_timeout_ms(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Base log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============================================================================
// Top-level config
// ============================================================================

/// Top-level configuration for the dexhand control service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Installed hand slots
    #[serde(default)]
    pub hand: HandSettings,

    /// Control loop cadences
    #[serde(default)]
    pub control: ControlSettings,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file yields the defaults; a malformed file is a fatal
    /// configuration error.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    }

    /// Resolve the active hand descriptor.
    ///
    /// Left takes precedence when both slots are marked present. No
    /// installed hand is a fatal configuration error.
    pub fn resolve_descriptor(&self) -> Result<HandDescriptor> {
        if self.hand.left_hand.exists {
            Ok(self.hand.left_hand.resolve(HandSide::Left))
        } else if self.hand.right_hand.exists {
            Ok(self.hand.right_hand.resolve(HandSide::Right))
        } else {
            Err(Error::Config(
                "no hand installed: set hand.left_hand.exists or hand.right_hand.exists".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.control.publish_interval_ms, 30);
        assert_eq!(config.control.poll_interval_ms, 500);
        assert_eq!(config.control.dwell_interval_ms, 1000);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.hand.left_hand.exists);
    }

    #[test]
    fn test_no_hand_is_fatal() {
        let config = Config::default();
        let err = config.resolve_descriptor().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_left_hand_precedence() {
        let mut config = Config::default();
        config.hand.left_hand.exists = true;
        config.hand.left_hand.joint = "L7".into();
        config.hand.right_hand.exists = true;
        config.hand.right_hand.joint = "L10".into();

        let descriptor = config.resolve_descriptor().unwrap();
        assert_eq!(descriptor.side, HandSide::Left);
        assert_eq!(descriptor.model, "L7");
    }

    #[test]
    fn test_right_hand_resolution() {
        let mut config = Config::default();
        config.hand.right_hand = HandSlot {
            exists: true,
            joint: "L10".into(),
            touch: true,
            can: Some("can1".into()),
            modbus: None,
        };

        let descriptor = config.resolve_descriptor().unwrap();
        assert_eq!(descriptor.side, HandSide::Right);
        assert!(descriptor.touch_capable);
        assert_eq!(descriptor.bus, BusConfig::Can("can1".into()));
    }

    #[test]
    fn test_modbus_wins_over_can() {
        let mut config = Config::default();
        config.hand.left_hand = HandSlot {
            exists: true,
            joint: "O6".into(),
            touch: false,
            can: Some("can0".into()),
            modbus: Some("/dev/ttyUSB0".into()),
        };

        let descriptor = config.resolve_descriptor().unwrap();
        assert_eq!(descriptor.bus, BusConfig::Modbus("/dev/ttyUSB0".into()));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.control.publish_interval_ms, 30);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"hand": {"left_hand": {"exists": true, "joint": "L7", "touch": true}}}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.hand.left_hand.exists);
        assert_eq!(config.hand.left_hand.joint, "L7");
        assert_eq!(config.control.poll_interval_ms, 500);
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.is_config());
    }
}
