//! Shared building blocks for the dexhand services.
//!
//! - [`error`]: the unified error type and status severity levels.
//! - [`config`]: the persisted hand settings and descriptor resolution.
//! - [`logging`]: tracing subscriber initialization.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result, Severity};
