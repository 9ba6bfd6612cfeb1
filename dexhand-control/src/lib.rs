//! Dexhand Control - coordinator service for a multi-joint robotic hand.
//!
//! Drives a single connected hand (left or right) through a driver
//! adapter: publishes commanded joint positions on a fixed cadence,
//! polls per-finger capacitive matrix telemetry, cycles through named
//! preset postures, and applies uniform speed/torque settings.
//!
//! The presentation layer consumes two broadcast feeds (status events
//! and matrix frames) and calls the [`control::HandCoordinator`]
//! command surface; it never touches the driver directly.

pub mod adapter;
pub mod control;
pub mod matrix;
pub mod model;
pub mod presets;
