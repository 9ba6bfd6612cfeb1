//! Per-model preset postures and initial positions.
//!
//! These tables are the static posture configuration for each joint
//! model. Every vector length matches the model's resolved joint count;
//! the coordinator still validates at apply time so a table edit can
//! never silently truncate a command.

use crate::model::{joint_count, JointVector};

/// A named canned posture for one hand model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetAction {
    pub name: &'static str,
    pub positions: JointVector,
}

impl PresetAction {
    fn new(name: &'static str, positions: &[u8]) -> Self {
        Self {
            name,
            positions: positions.to_vec(),
        }
    }
}

/// Slider labels for the model's joints, in command order.
pub fn joint_names(model: &str) -> Vec<&'static str> {
    match joint_count(model) {
        6 => vec![
            "thumb_bend",
            "thumb_rotate",
            "index_bend",
            "middle_bend",
            "ring_bend",
            "little_bend",
        ],
        7 => vec![
            "thumb_bend",
            "thumb_rotate",
            "index_bend",
            "middle_bend",
            "ring_bend",
            "little_bend",
            "wrist",
        ],
        10 => vec![
            "thumb_bend",
            "thumb_rotate",
            "index_bend",
            "middle_bend",
            "ring_bend",
            "little_bend",
            "thumb_swing",
            "index_swing",
            "ring_swing",
            "little_swing",
        ],
        _ => vec!["thumb", "index", "middle", "ring", "little"],
    }
}

/// The model's default initial posture (fully open).
pub fn initial_posture(model: &str) -> JointVector {
    vec![255; joint_count(model)]
}

/// System presets for the model. May be empty for unknown models,
/// in which case cycling is rejected as unsupported.
pub fn presets_for(model: &str) -> Vec<PresetAction> {
    match joint_count(model) {
        6 => vec![
            PresetAction::new("open", &[255, 128, 255, 255, 255, 255]),
            PresetAction::new("fist", &[0, 128, 0, 0, 0, 0]),
            PresetAction::new("point", &[0, 128, 255, 0, 0, 0]),
            PresetAction::new("pinch", &[96, 180, 96, 255, 255, 255]),
        ],
        7 => vec![
            PresetAction::new("open", &[255, 128, 255, 255, 255, 255, 128]),
            PresetAction::new("fist", &[0, 128, 0, 0, 0, 0, 128]),
            PresetAction::new("point", &[0, 128, 255, 0, 0, 0, 128]),
            PresetAction::new("pinch", &[96, 180, 96, 255, 255, 255, 128]),
            PresetAction::new("wave", &[255, 128, 255, 255, 255, 255, 40]),
        ],
        10 => vec![
            PresetAction::new(
                "open",
                &[255, 128, 255, 255, 255, 255, 255, 255, 255, 255],
            ),
            PresetAction::new("fist", &[0, 128, 0, 0, 0, 0, 128, 128, 128, 128]),
            PresetAction::new("point", &[0, 128, 255, 0, 0, 0, 128, 255, 128, 128]),
            PresetAction::new("pinch", &[96, 180, 96, 255, 255, 255, 200, 128, 128, 128]),
            PresetAction::new("ok", &[80, 170, 80, 255, 255, 255, 210, 140, 128, 128]),
        ],
        _ => vec![
            PresetAction::new("open", &[255, 255, 255, 255, 255]),
            PresetAction::new("fist", &[0, 0, 0, 0, 0]),
        ],
    }
}
