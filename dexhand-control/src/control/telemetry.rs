//! Telemetry poller: five sensor fetches folded into one frame.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::adapter::{bounded, DriverAdapter};
use crate::matrix::normalize;
use crate::model::{Finger, MatrixFrame};

/// Pulls the five finger matrices through the driver and folds them
/// into one [`MatrixFrame`].
///
/// A driver-level failure on any finger abandons the partial frame and
/// yields an all-zero frame for all five fingers. This whole-frame
/// fallback is deliberately stronger than the normalizer's per-finger
/// isolation: a bus fault invalidates the snapshot, a malformed payload
/// does not.
pub struct TelemetryPoller {
    adapter: Arc<dyn DriverAdapter>,
    call_timeout: Duration,
}

impl TelemetryPoller {
    pub fn new(adapter: Arc<dyn DriverAdapter>, call_timeout: Duration) -> Self {
        Self {
            adapter,
            call_timeout,
        }
    }

    /// Fetch and normalize all five pads into one frame.
    pub async fn collect_frame(&self) -> MatrixFrame {
        let mut pads: [Vec<u16>; 5] = Default::default();
        for (slot, finger) in Finger::ALL.into_iter().enumerate() {
            match bounded(self.call_timeout, self.adapter.matrix(finger)).await {
                Ok(raw) => pads[slot] = normalize(&raw),
                Err(error) => {
                    debug!(
                        finger = finger.label(),
                        error = %error,
                        "Matrix fetch failed, substituting zero frame"
                    );
                    return MatrixFrame::zeroed();
                }
            }
        }
        MatrixFrame::from_pads(pads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SimDriverAdapter;

    #[tokio::test]
    async fn test_collect_frame_covers_all_fingers() {
        let sim = Arc::new(SimDriverAdapter::new());
        let poller = TelemetryPoller::new(Arc::clone(&sim) as _, Duration::from_millis(100));

        let frame = poller.collect_frame().await;
        assert_eq!(sim.matrix_calls(), 5);
        assert!(!frame.is_zeroed());
    }

    #[tokio::test]
    async fn test_single_failure_zeroes_whole_frame() {
        let sim = Arc::new(SimDriverAdapter::new());
        sim.set_fail_matrices(true);
        let poller = TelemetryPoller::new(Arc::clone(&sim) as _, Duration::from_millis(100));

        let frame = poller.collect_frame().await;
        // All five pads zeroed, not just the failing one.
        assert!(frame.is_zeroed());
        for finger in Finger::ALL {
            assert!(frame.pad(finger).iter().all(|&v| v == 0));
        }
    }
}
