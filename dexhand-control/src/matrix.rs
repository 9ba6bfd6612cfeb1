//! Matrix payload normalization and the touch heat ramp.
//!
//! Drivers return per-finger payloads in whatever shape the firmware
//! produced (flat, nested row-major, or empty). [`normalize`] turns any
//! of them into exactly [`MATRIX_CELLS`] non-negative intensities, and
//! isolates a malformed payload to that finger alone.

use crate::adapter::RawMatrix;
use crate::model::MATRIX_CELLS;

/// Normalize one raw payload into a flat sequence of exactly 72 cells.
///
/// - empty payload: 72 zeros
/// - nested payload: inner rows concatenated in order
/// - short payload: zero-padded; long payload: truncated
/// - any negative element: a processing error, 72 zeros for this
///   finger only (values beyond `u16::MAX` saturate instead)
pub fn normalize(raw: &RawMatrix) -> Vec<u16> {
    match raw {
        RawMatrix::Empty => vec![0; MATRIX_CELLS],
        RawMatrix::Flat(cells) => coerce(cells.iter().copied()),
        RawMatrix::Nested(rows) => coerce(rows.iter().flatten().copied()),
    }
}

fn coerce(cells: impl Iterator<Item = i64>) -> Vec<u16> {
    let mut out = Vec::with_capacity(MATRIX_CELLS);
    for cell in cells.take(MATRIX_CELLS) {
        if cell < 0 {
            return vec![0; MATRIX_CELLS];
        }
        out.push(u16::try_from(cell).unwrap_or(u16::MAX));
    }
    out.resize(MATRIX_CELLS, 0);
    out
}

/// Map one cell intensity to its display color.
///
/// White-to-deep-red ramp in two linear segments with a break at 128:
/// - 0: no-touch gray
/// - 1..=127: red 255, green/blue ramp 255 down to ~200
/// - 128..=255: red 255, green/blue ramp 200 down to 0
///
/// Inputs above 255 saturate. The two-segment shape and the breakpoint
/// at 128 are a contract with the operator display, not styling.
pub fn heat_rgb(value: u16) -> (u8, u8, u8) {
    let v = u32::from(value.min(255));
    if v == 0 {
        (200, 200, 200)
    } else if v < 128 {
        let gb = (255 - v * 55 / 128) as u8;
        (255, gb, gb)
    } else {
        let gb = (200 - (v - 128) * 200 / 127) as u8;
        (255, gb, gb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_flattens_in_order() {
        let raw = RawMatrix::Nested(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        let flat = normalize(&raw);
        assert_eq!(flat.len(), MATRIX_CELLS);
        assert_eq!(&flat[..6], &[1, 2, 3, 4, 5, 6]);
        assert!(flat[6..].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_empty_is_all_zeros() {
        assert_eq!(normalize(&RawMatrix::Empty), vec![0; MATRIX_CELLS]);
    }

    #[test]
    fn test_flat_used_as_is() {
        let cells: Vec<i64> = (0..MATRIX_CELLS as i64).collect();
        let flat = normalize(&RawMatrix::Flat(cells));
        assert_eq!(flat[0], 0);
        assert_eq!(flat[71], 71);
    }

    #[test]
    fn test_long_payload_truncates() {
        let cells = vec![7i64; MATRIX_CELLS + 30];
        let flat = normalize(&RawMatrix::Flat(cells));
        assert_eq!(flat.len(), MATRIX_CELLS);
        assert!(flat.iter().all(|&v| v == 7));
    }

    #[test]
    fn test_negative_element_zeroes_whole_pad() {
        let raw = RawMatrix::Nested(vec![vec![1, 2], vec![3, -4]]);
        assert_eq!(normalize(&raw), vec![0; MATRIX_CELLS]);
    }

    #[test]
    fn test_oversized_values_saturate() {
        let flat = normalize(&RawMatrix::Flat(vec![i64::from(u16::MAX) + 500]));
        assert_eq!(flat[0], u16::MAX);
    }

    #[test]
    fn test_heat_ramp_boundaries() {
        assert_eq!(heat_rgb(0), (200, 200, 200));
        assert_eq!(heat_rgb(1), (255, 255, 255));
        assert_eq!(heat_rgb(127), (255, 201, 201));
        // Visible break at the midpoint.
        assert_eq!(heat_rgb(128), (255, 200, 200));
        assert_eq!(heat_rgb(255), (255, 0, 0));
        // Saturation above the display range.
        assert_eq!(heat_rgb(5000), (255, 0, 0));
    }

    #[test]
    fn test_heat_ramp_monotonic_within_segments() {
        let mut previous = heat_rgb(1).1;
        for v in 2..=127 {
            let gb = heat_rgb(v).1;
            assert!(gb <= previous);
            previous = gb;
        }
        let mut previous = heat_rgb(128).1;
        for v in 129..=255 {
            let gb = heat_rgb(v).1;
            assert!(gb <= previous);
            previous = gb;
        }
    }
}
