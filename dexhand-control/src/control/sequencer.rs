//! Cyclic preset sequencer state machine.
//!
//! Pure state: idle or running, plus a cursor into the preset list.
//! The coordinator owns the dwell timer and calls [`PresetSequencer::advance`]
//! on each tick; this type never touches the driver.

use dexhand_common::{Error, Result};

use crate::presets::PresetAction;

/// On/off cyclic scheduler over a model's preset list.
#[derive(Debug, Clone)]
pub struct PresetSequencer {
    presets: Vec<PresetAction>,
    cursor: Option<usize>,
    active: bool,
}

impl PresetSequencer {
    pub fn new(presets: Vec<PresetAction>) -> Self {
        Self {
            presets,
            cursor: None,
            active: false,
        }
    }

    /// Whether a cycle is currently running.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The last visited preset index. Retained after [`stop`](Self::stop)
    /// so the "last active" slot can still be queried while idle; it is
    /// only meaningful while running.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }

    /// Look up a preset by name.
    pub fn find(&self, name: &str) -> Option<&PresetAction> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Arm the cycle. Rejected when the model has no presets; otherwise
    /// the cursor is reset so the first advance lands on index 0.
    pub fn start(&mut self) -> Result<()> {
        if self.presets.is_empty() {
            return Err(Error::Unsupported(
                "this hand model has no presets to cycle".into(),
            ));
        }
        self.cursor = None;
        self.active = true;
        Ok(())
    }

    /// Disarm the cycle. The cursor keeps its last value until the next
    /// start.
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Step to the next preset, wrapping around the list.
    pub fn advance(&mut self) -> Option<&PresetAction> {
        if self.presets.is_empty() {
            return None;
        }
        let next = match self.cursor {
            None => 0,
            Some(current) => (current + 1) % self.presets.len(),
        };
        self.cursor = Some(next);
        Some(&self.presets[next])
    }
}
