//! Hand control coordinator.
//!
//! Owns the resolved descriptor, the commanded joint vector, the preset
//! sequencer, and the guard that serializes driver calls. Runs a single
//! cooperative loop over three cadences: joint publish (30 ms default),
//! matrix telemetry poll (500 ms default), and the preset dwell
//! (1000 ms default, ignored while no cycle is active).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use dexhand_common::config::{ControlSettings, HandDescriptor};
use dexhand_common::{Error, Result};

use super::sequencer::PresetSequencer;
use super::telemetry::TelemetryPoller;
use super::StatusEvent;
use crate::adapter::{bounded, DriverAdapter};
use crate::model::{joint_count, JointVector, MatrixFrame};
use crate::presets::{initial_posture, presets_for, PresetAction};

/// Coordinator run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Loop not started
    Idle,
    /// Loop running
    Running,
    /// Loop stopping
    Stopping,
    /// Loop stopped
    Stopped,
}

/// Coordinates manual and sequenced actuation of one hand and mirrors
/// its touch state back to the operator.
///
/// All driver calls go through the internal guard: acquired before the
/// call, released only after it returns or fails. The telemetry poller
/// skips its tick when the guard is held rather than queueing behind an
/// actuation.
pub struct HandCoordinator {
    descriptor: HandDescriptor,
    joint_count: usize,
    settings: ControlSettings,
    adapter: Arc<dyn DriverAdapter>,
    presets: Vec<PresetAction>,
    call_timeout: Duration,

    /// Serializes driver calls (the mutual-exclusion guard).
    gate: Mutex<()>,
    /// Current commanded joint vector, read by every publish tick.
    commanded: RwLock<JointVector>,
    sequencer: Mutex<PresetSequencer>,
    /// When the cycle last advanced; dwell ticks inside the window are
    /// ignored, so a cycle started mid-phase still gets a full dwell.
    last_advance: RwLock<Instant>,
    run_state: RwLock<RunState>,
    shut_down: AtomicBool,

    poller: TelemetryPoller,
    status_tx: broadcast::Sender<StatusEvent>,
    telemetry_tx: broadcast::Sender<MatrixFrame>,
}

impl HandCoordinator {
    /// Create a coordinator with the model's system preset table.
    pub fn new(
        descriptor: HandDescriptor,
        settings: ControlSettings,
        adapter: Arc<dyn DriverAdapter>,
    ) -> Self {
        let presets = presets_for(&descriptor.model);
        Self::with_presets(descriptor, settings, adapter, presets)
    }

    /// Create a coordinator with an explicit preset table.
    pub fn with_presets(
        descriptor: HandDescriptor,
        settings: ControlSettings,
        adapter: Arc<dyn DriverAdapter>,
        presets: Vec<PresetAction>,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(100);
        let (telemetry_tx, _) = broadcast::channel(16);
        let call_timeout = Duration::from_millis(settings.adapter_timeout_ms);

        Self {
            joint_count: joint_count(&descriptor.model),
            commanded: RwLock::new(initial_posture(&descriptor.model)),
            sequencer: Mutex::new(PresetSequencer::new(presets.clone())),
            last_advance: RwLock::new(Instant::now()),
            poller: TelemetryPoller::new(Arc::clone(&adapter), call_timeout),
            descriptor,
            settings,
            adapter,
            presets,
            call_timeout,
            gate: Mutex::new(()),
            run_state: RwLock::new(RunState::Idle),
            shut_down: AtomicBool::new(false),
            status_tx,
            telemetry_tx,
        }
    }

    /// Subscribe to the status feed.
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_tx.subscribe()
    }

    /// Subscribe to the matrix telemetry feed.
    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<MatrixFrame> {
        self.telemetry_tx.subscribe()
    }

    /// The resolved hand descriptor.
    pub fn descriptor(&self) -> &HandDescriptor {
        &self.descriptor
    }

    /// Joint count resolved from the descriptor's model.
    pub fn joint_count(&self) -> usize {
        self.joint_count
    }

    /// The preset table for the active model.
    pub fn presets(&self) -> &[PresetAction] {
        &self.presets
    }

    /// Get current run state.
    pub async fn run_state(&self) -> RunState {
        *self.run_state.read().await
    }

    /// Whether a preset cycle is currently running.
    pub async fn cycle_active(&self) -> bool {
        self.sequencer.lock().await.is_active()
    }

    /// Last visited preset index, if a cycle has ever advanced.
    pub async fn current_preset_index(&self) -> Option<usize> {
        self.sequencer.lock().await.cursor()
    }

    /// Snapshot of the current commanded vector.
    pub async fn commanded_vector(&self) -> JointVector {
        self.commanded.read().await.clone()
    }

    /// Replace the whole commanded vector.
    ///
    /// Rejected when the length does not match the resolved joint
    /// count; the current vector is left untouched.
    pub async fn set_commanded_vector(&self, positions: JointVector) -> Result<()> {
        if positions.len() != self.joint_count {
            let error = Error::Validation(format!(
                "joint vector length {} does not match model {} (expected {})",
                positions.len(),
                self.descriptor.model,
                self.joint_count
            ));
            self.report(&error);
            return Err(error);
        }
        *self.commanded.write().await = positions;
        Ok(())
    }

    /// Edit a single joint of the commanded vector.
    ///
    /// The new value rides the next publish tick; per-joint edits do
    /// not force an immediate publish.
    pub async fn set_joint(&self, index: usize, value: u8) -> Result<()> {
        if index >= self.joint_count {
            let error = Error::Validation(format!(
                "joint index {index} out of range for model {} ({} joints)",
                self.descriptor.model, self.joint_count
            ));
            self.report(&error);
            return Err(error);
        }
        self.commanded.write().await[index] = value;
        Ok(())
    }

    /// Apply a named preset and publish immediately.
    pub async fn apply_preset(&self, name: &str) -> Result<()> {
        let preset = self.sequencer.lock().await.find(name).cloned();
        let Some(preset) = preset else {
            let error = Error::Validation(format!(
                "unknown preset '{name}' for model {}",
                self.descriptor.model
            ));
            self.report(&error);
            return Err(error);
        };

        self.set_commanded_vector(preset.positions).await?;
        self.publish_joints().await;
        self.emit(StatusEvent::info(format!("preset '{name}' applied")));
        Ok(())
    }

    /// Return to the model's initial posture and publish immediately.
    pub async fn go_home(&self) -> Result<()> {
        let home = initial_posture(&self.descriptor.model);
        *self.commanded.write().await = home;
        self.publish_joints().await;
        self.emit(StatusEvent::info("returned to initial posture"));
        Ok(())
    }

    /// Toggle the preset cycle.
    ///
    /// The operator control is a single toggle: starting while a cycle
    /// is already running stops it. A fresh start resets the cursor and
    /// advances immediately instead of waiting out the first dwell.
    pub async fn start_cycle(&self) -> Result<()> {
        {
            let mut sequencer = self.sequencer.lock().await;
            if sequencer.is_active() {
                sequencer.stop();
                drop(sequencer);
                self.emit(StatusEvent::info("preset cycle stopped"));
                return Ok(());
            }
            if let Err(error) = sequencer.start() {
                drop(sequencer);
                self.report(&error);
                return Err(error);
            }
        }
        self.emit(StatusEvent::info(format!(
            "preset cycle started ({} presets, dwell {}ms)",
            self.presets.len(),
            self.settings.dwell_interval_ms
        )));
        self.advance_cycle().await;
        Ok(())
    }

    /// Stop the preset cycle. A no-op when no cycle is running.
    pub async fn stop_cycle(&self) -> Result<()> {
        let mut sequencer = self.sequencer.lock().await;
        if sequencer.is_active() {
            sequencer.stop();
            drop(sequencer);
            self.emit(StatusEvent::info("preset cycle stopped"));
        }
        Ok(())
    }

    /// Apply a uniform speed value across all joints.
    pub async fn set_speed(&self, value: u8) -> Result<()> {
        let values = vec![value; self.joint_count];
        let _guard = self.gate.lock().await;
        match bounded(self.call_timeout, self.adapter.set_speed(&values)).await {
            Ok(()) => {
                self.emit(StatusEvent::info(format!("speed set to {value}")));
                Ok(())
            }
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        }
    }

    /// Apply a uniform torque value across all joints.
    pub async fn set_torque(&self, value: u8) -> Result<()> {
        let values = vec![value; self.joint_count];
        let _guard = self.gate.lock().await;
        match bounded(self.call_timeout, self.adapter.set_torque(&values)).await {
            Ok(()) => {
                self.emit(StatusEvent::info(format!("torque set to {value}")));
                Ok(())
            }
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        }
    }

    /// Run the control loop until shutdown.
    pub async fn run(&self) -> Result<()> {
        {
            let mut state = self.run_state.write().await;
            *state = RunState::Running;
        }
        info!(
            model = %self.descriptor.model,
            side = self.descriptor.side.label(),
            publish_ms = self.settings.publish_interval_ms,
            poll_ms = self.settings.poll_interval_ms,
            "Control loop started"
        );
        self.emit(StatusEvent::info("control loop started"));

        let mut publish_ticks = interval(Duration::from_millis(self.settings.publish_interval_ms));
        let mut poll_ticks = interval(Duration::from_millis(self.settings.poll_interval_ms));
        let mut dwell_ticks = interval(Duration::from_millis(self.settings.dwell_interval_ms));
        // Ticks missed while a driver call stalls are dropped, never
        // replayed back-to-back.
        publish_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        poll_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        dwell_ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = publish_ticks.tick() => {
                    match *self.run_state.read().await {
                        RunState::Stopping | RunState::Stopped => break,
                        RunState::Running => self.publish_joints().await,
                        RunState::Idle => continue,
                    }
                }

                _ = poll_ticks.tick() => {
                    match *self.run_state.read().await {
                        RunState::Stopping | RunState::Stopped => break,
                        RunState::Running => self.poll_telemetry().await,
                        RunState::Idle => continue,
                    }
                }

                _ = dwell_ticks.tick() => {
                    match *self.run_state.read().await {
                        RunState::Stopping | RunState::Stopped => break,
                        RunState::Running => {
                            if self.cycle_active().await && self.dwell_elapsed().await {
                                self.advance_cycle().await;
                            }
                        }
                        RunState::Idle => continue,
                    }
                }
            }
        }

        {
            let mut state = self.run_state.write().await;
            *state = RunState::Stopped;
        }
        info!("Control loop stopped");
        Ok(())
    }

    /// Stop the loop and close the driver connection. Idempotent.
    pub async fn shutdown(&self) -> Result<()> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        {
            let mut state = self.run_state.write().await;
            *state = match *state {
                RunState::Running => RunState::Stopping,
                _ => RunState::Stopped,
            };
        }
        self.sequencer.lock().await.stop();

        // The gate drains any in-flight driver call before the close.
        let _guard = self.gate.lock().await;
        if let Err(error) = bounded(self.call_timeout, self.adapter.close()).await {
            self.report(&error);
        } else {
            self.emit(StatusEvent::info("driver connection closed"));
        }
        info!("Coordinator shut down");
        Ok(())
    }

    /// Forward the commanded vector to the driver.
    ///
    /// Failures are reported and swallowed: a failed publish never
    /// stops future publishes.
    async fn publish_joints(&self) {
        let positions = self.commanded.read().await.clone();
        let _guard = self.gate.lock().await;
        if let Err(error) = bounded(self.call_timeout, self.adapter.move_joints(&positions)).await
        {
            self.report(&error);
        }
    }

    /// One telemetry poll tick.
    ///
    /// Skipped entirely when the hand has no touch pads or the guard is
    /// currently held by an actuation call.
    pub(crate) async fn poll_telemetry(&self) {
        if !self.descriptor.touch_capable {
            return;
        }
        let Ok(_guard) = self.gate.try_lock() else {
            debug!("Guard held, skipping telemetry poll");
            return;
        };
        let frame = self.poller.collect_frame().await;
        drop(_guard);
        let _ = self.telemetry_tx.send(frame);
    }

    /// Whether a full dwell has passed since the last cycle advance.
    ///
    /// The dwell ticker runs for the whole loop lifetime, so its phase
    /// does not restart when a cycle starts; the window since the last
    /// advance is what actually gates the next step.
    async fn dwell_elapsed(&self) -> bool {
        self.last_advance.read().await.elapsed()
            >= Duration::from_millis(self.settings.dwell_interval_ms)
    }

    /// Advance the cycle by one preset and publish immediately.
    async fn advance_cycle(&self) {
        let step = {
            let mut sequencer = self.sequencer.lock().await;
            let count = sequencer.preset_count();
            let advanced = sequencer
                .advance()
                .map(|preset| (preset.name, preset.positions.clone()));
            let index = sequencer.cursor().unwrap_or(0);
            advanced.map(|(name, positions)| (name, positions, index, count))
        };
        let Some((name, positions, index, count)) = step else {
            return;
        };
        *self.last_advance.write().await = Instant::now();

        if self.set_commanded_vector(positions).await.is_err() {
            // Reported inside set_commanded_vector; the cycle keeps
            // going so one bad table entry cannot wedge it.
            return;
        }
        self.publish_joints().await;
        self.emit(StatusEvent::info(format!(
            "cycling preset '{name}' ({}/{count})",
            index + 1
        )));
    }

    fn emit(&self, event: StatusEvent) {
        let _ = self.status_tx.send(event);
    }

    fn report(&self, error: &Error) {
        warn!(error = %error, "Operation failed");
        self.emit(StatusEvent::from_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::SimDriverAdapter;
    use dexhand_common::config::{BusConfig, HandSide};

    fn descriptor(model: &str, touch: bool) -> HandDescriptor {
        HandDescriptor {
            side: HandSide::Left,
            model: model.to_string(),
            touch_capable: touch,
            bus: BusConfig::Can("can0".into()),
        }
    }

    fn settings() -> ControlSettings {
        ControlSettings {
            publish_interval_ms: 5,
            poll_interval_ms: 5,
            dwell_interval_ms: 40,
            adapter_timeout_ms: 200,
        }
    }

    fn coordinator(model: &str, touch: bool) -> (HandCoordinator, Arc<SimDriverAdapter>) {
        let sim = Arc::new(SimDriverAdapter::new());
        let coordinator =
            HandCoordinator::new(descriptor(model, touch), settings(), Arc::clone(&sim) as _);
        (coordinator, sim)
    }

    #[tokio::test]
    async fn test_poll_skipped_while_guard_held() {
        let (coordinator, sim) = coordinator("L7", true);

        let held = coordinator.gate.lock().await;
        coordinator.poll_telemetry().await;
        assert_eq!(sim.matrix_calls(), 0);
        drop(held);

        let mut telemetry_rx = coordinator.subscribe_telemetry();
        coordinator.poll_telemetry().await;
        assert_eq!(sim.matrix_calls(), 5);
        let frame = telemetry_rx.try_recv().unwrap();
        assert!(!frame.is_zeroed());
    }

    #[tokio::test]
    async fn test_poll_skipped_without_touch_pads() {
        let (coordinator, sim) = coordinator("L7", false);
        coordinator.poll_telemetry().await;
        assert_eq!(sim.matrix_calls(), 0);
    }

    #[tokio::test]
    async fn test_driver_fault_emits_zero_frame() {
        let (coordinator, sim) = coordinator("L7", true);
        sim.set_fail_matrices(true);

        let mut telemetry_rx = coordinator.subscribe_telemetry();
        coordinator.poll_telemetry().await;
        let frame = telemetry_rx.try_recv().unwrap();
        assert!(frame.is_zeroed());
    }

    #[tokio::test]
    async fn test_set_joint_bounds() {
        let (coordinator, _sim) = coordinator("O6", false);
        coordinator.set_joint(0, 17).await.unwrap();
        assert_eq!(coordinator.commanded_vector().await[0], 17);

        let err = coordinator.set_joint(6, 0).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let (coordinator, sim) = coordinator("L7", false);
        sim.set_fail_moves(true);

        let mut status_rx = coordinator.subscribe_status();
        coordinator.publish_joints().await;
        let event = status_rx.try_recv().unwrap();
        assert_eq!(event.severity, dexhand_common::Severity::Error);
    }
}
