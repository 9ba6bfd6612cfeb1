//! Dexhand control service entrypoint.
//!
//! Loads the hand settings, resolves the active descriptor, and runs
//! the coordinator loop until Ctrl-C. Status events are mirrored into
//! the log so the service is observable without a connected UI.

use std::sync::Arc;

use anyhow::Result;

use dexhand_common::config::Config;
use dexhand_common::logging::init_logging;
use dexhand_common::Severity;
use dexhand_control::adapter::SimDriverAdapter;
use dexhand_control::control::HandCoordinator;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("dexhand-control v{}", env!("CARGO_PKG_VERSION"));

    let descriptor = config.resolve_descriptor()?;
    tracing::info!(
        side = descriptor.side.label(),
        model = %descriptor.model,
        touch = descriptor.touch_capable,
        bus = ?descriptor.bus,
        "Hand descriptor resolved"
    );

    // Bus-level drivers live in the hardware crates; the simulator
    // stands in so the service runs without a connected hand.
    let adapter = Arc::new(SimDriverAdapter::new());
    let coordinator = Arc::new(HandCoordinator::new(
        descriptor,
        config.control.clone(),
        adapter,
    ));

    // Mirror the status feed into the log.
    let mut status_rx = coordinator.subscribe_status();
    tokio::spawn(async move {
        while let Ok(event) = status_rx.recv().await {
            match event.severity {
                Severity::Info => tracing::info!(status = %event.message, "Status"),
                Severity::Warning => tracing::warn!(status = %event.message, "Status"),
                Severity::Error => tracing::error!(status = %event.message, "Status"),
            }
        }
    });

    let runner = Arc::clone(&coordinator);
    let loop_task = tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    coordinator.shutdown().await?;
    loop_task.await??;

    Ok(())
}
