//! Driver adapter contract and the in-process simulator.
//!
//! The coordinator never speaks a bus protocol. It publishes to a
//! [`DriverAdapter`], and adapters translate into whatever the hardware
//! actually needs (CAN, Modbus, or nothing at all for the simulator).

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use dexhand_common::{Error, Result};

use crate::model::{Finger, MATRIX_COLS, MATRIX_ROWS};

/// Raw per-finger matrix payload as the driver hands it over.
///
/// Firmware revisions disagree on shape: some drivers return the 72
/// cells flat, some return 12 rows of 6, and a pad that is not fitted
/// returns nothing. Normalization lives in [`crate::matrix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMatrix {
    /// Row-major nested payload (one inner sequence per sensor row).
    Nested(Vec<Vec<i64>>),
    /// Already-flat payload.
    Flat(Vec<i64>),
    /// No payload available.
    Empty,
}

/// Hardware driver contract consumed by the coordinator.
///
/// Every operation may fail; failures are recovered locally by the
/// coordinator and surfaced on the status feed, never propagated as
/// fatal faults after initialization.
#[async_trait]
pub trait DriverAdapter: Send + Sync {
    /// Get the adapter name for logs.
    fn name(&self) -> &'static str;

    /// Command the joints to the given positions.
    async fn move_joints(&self, positions: &[u8]) -> Result<()>;

    /// Apply per-joint speed values.
    async fn set_speed(&self, values: &[u8]) -> Result<()>;

    /// Apply per-joint torque values.
    async fn set_torque(&self, values: &[u8]) -> Result<()>;

    /// Fetch the raw capacitive matrix for one finger.
    async fn matrix(&self, finger: Finger) -> Result<RawMatrix>;

    /// Release the underlying bus connection.
    async fn close(&self) -> Result<()>;
}

/// Bound a driver call so a stuck bus cannot stall the control loop.
///
/// A timeout surfaces as a transient [`Error::Adapter`].
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Adapter(format!(
            "driver call exceeded {}ms",
            limit.as_millis()
        ))),
    }
}

// ============================================================================
// Simulated driver
// ============================================================================

#[derive(Debug, Default)]
struct SimState {
    moves: Vec<Vec<u8>>,
    speed: Option<Vec<u8>>,
    torque: Option<Vec<u8>>,
}

/// In-process driver simulator.
///
/// Journals every actuation call and serves synthetic capacitive
/// frames, so the service runs and the behavior tests pass without a
/// connected hand. Failure injection covers the sensor and actuation
/// paths separately.
pub struct SimDriverAdapter {
    state: Mutex<SimState>,
    matrix_calls: AtomicU64,
    fail_matrices: AtomicBool,
    fail_moves: AtomicBool,
    move_delay: Mutex<Option<Duration>>,
    closed: AtomicBool,
}

impl SimDriverAdapter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            matrix_calls: AtomicU64::new(0),
            fail_matrices: AtomicBool::new(false),
            fail_moves: AtomicBool::new(false),
            move_delay: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Make every sensor fetch fail until cleared.
    pub fn set_fail_matrices(&self, fail: bool) {
        self.fail_matrices.store(fail, Ordering::SeqCst);
    }

    /// Make every actuation call fail until cleared.
    pub fn set_fail_moves(&self, fail: bool) {
        self.fail_moves.store(fail, Ordering::SeqCst);
    }

    /// Stall the next joint move once; later calls return immediately.
    pub fn delay_next_move(&self, delay: Duration) {
        *self.move_delay.lock().expect("sim state poisoned") = Some(delay);
    }

    /// Number of sensor fetches performed so far.
    pub fn matrix_calls(&self) -> u64 {
        self.matrix_calls.load(Ordering::SeqCst)
    }

    /// Journal of all commanded joint vectors, oldest first.
    pub fn moves(&self) -> Vec<Vec<u8>> {
        self.state.lock().expect("sim state poisoned").moves.clone()
    }

    /// Most recently commanded joint vector.
    pub fn last_joints(&self) -> Option<Vec<u8>> {
        self.state
            .lock()
            .expect("sim state poisoned")
            .moves
            .last()
            .cloned()
    }

    /// Most recently applied speed vector.
    pub fn last_speed(&self) -> Option<Vec<u8>> {
        self.state.lock().expect("sim state poisoned").speed.clone()
    }

    /// Most recently applied torque vector.
    pub fn last_torque(&self) -> Option<Vec<u8>> {
        self.state.lock().expect("sim state poisoned").torque.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Adapter("driver connection closed".into()));
        }
        Ok(())
    }
}

impl Default for SimDriverAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriverAdapter for SimDriverAdapter {
    fn name(&self) -> &'static str {
        "sim"
    }

    async fn move_joints(&self, positions: &[u8]) -> Result<()> {
        self.check_open()?;
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(Error::Adapter("simulated actuation fault".into()));
        }
        let delay = self.move_delay.lock().expect("sim state poisoned").take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().expect("sim state poisoned");
        state.moves.push(positions.to_vec());
        Ok(())
    }

    async fn set_speed(&self, values: &[u8]) -> Result<()> {
        self.check_open()?;
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(Error::Adapter("simulated actuation fault".into()));
        }
        let mut state = self.state.lock().expect("sim state poisoned");
        state.speed = Some(values.to_vec());
        Ok(())
    }

    async fn set_torque(&self, values: &[u8]) -> Result<()> {
        self.check_open()?;
        if self.fail_moves.load(Ordering::SeqCst) {
            return Err(Error::Adapter("simulated actuation fault".into()));
        }
        let mut state = self.state.lock().expect("sim state poisoned");
        state.torque = Some(values.to_vec());
        Ok(())
    }

    async fn matrix(&self, finger: Finger) -> Result<RawMatrix> {
        self.check_open()?;
        self.matrix_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_matrices.load(Ordering::SeqCst) {
            return Err(Error::Adapter("simulated sensor fault".into()));
        }

        // Low noise floor plus one pressure blob per finger, row-major
        // nested like the real firmware returns it.
        let mut rng = rand::thread_rng();
        let hot_row = 3 + finger as usize;
        let mut rows = Vec::with_capacity(MATRIX_ROWS);
        for row in 0..MATRIX_ROWS {
            let mut cells = Vec::with_capacity(MATRIX_COLS);
            for col in 0..MATRIX_COLS {
                let base: i64 = rng.gen_range(0..24);
                let boost = if row == hot_row && (2..4).contains(&col) {
                    180
                } else {
                    0
                };
                cells.push(base + boost);
            }
            rows.push(cells);
        }
        Ok(RawMatrix::Nested(rows))
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
