//! Hand model identifiers, joint vectors, and matrix frame types.

use serde::{Deserialize, Serialize};

/// Rows in one finger's capacitive sensor grid.
pub const MATRIX_ROWS: usize = 12;
/// Columns in one finger's capacitive sensor grid.
pub const MATRIX_COLS: usize = 6;
/// Cells in one finger's flattened matrix.
pub const MATRIX_CELLS: usize = MATRIX_ROWS * MATRIX_COLS;

/// Ordered per-joint target positions, one byte per joint.
///
/// The `u8` element type is the [0,255] position contract; the length
/// is fixed by the hand model via [`joint_count`].
pub type JointVector = Vec<u8>;

/// Resolve the expected joint-vector length for a hand model.
///
/// "O6" and "L6" share a six-joint layout and match case-insensitively;
/// "L7" and "L10" match exactly. Unknown identifiers fall through to
/// the five-joint default - there is no error path.
pub fn joint_count(model: &str) -> usize {
    if model.eq_ignore_ascii_case("O6") || model.eq_ignore_ascii_case("L6") {
        6
    } else if model == "L7" {
        7
    } else if model == "L10" {
        10
    } else {
        5
    }
}

/// Finger identifier for the five capacitive pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl Finger {
    /// All fingers in polling order.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Little,
    ];

    /// Get the finger label used in logs and feeds.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Little => "little",
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// One combined touch snapshot: 72 intensities per finger.
///
/// Frames are rebuilt whole on every poll and replaced atomically on
/// the telemetry feed; a frame is never partially updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixFrame {
    pads: [Vec<u16>; 5],
}

impl MatrixFrame {
    /// An all-zero frame (the failure fallback and the no-touch default).
    pub fn zeroed() -> Self {
        Self {
            pads: std::array::from_fn(|_| vec![0; MATRIX_CELLS]),
        }
    }

    /// Build a frame from per-finger pads, in [`Finger::ALL`] order.
    pub fn from_pads(pads: [Vec<u16>; 5]) -> Self {
        Self { pads }
    }

    /// Intensities for one finger, always exactly [`MATRIX_CELLS`] long.
    pub fn pad(&self, finger: Finger) -> &[u16] {
        &self.pads[finger.slot()]
    }

    /// True when every cell of every finger is zero.
    pub fn is_zeroed(&self) -> bool {
        self.pads.iter().all(|p| p.iter().all(|&v| v == 0))
    }
}

impl Default for MatrixFrame {
    fn default() -> Self {
        Self::zeroed()
    }
}
