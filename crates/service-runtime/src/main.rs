//! Entry point for the signing core service.

use anyhow::Context;
use identity_telemetry::init_telemetry;
use service_runtime::{Container, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env();
    let _guard = init_telemetry(config.telemetry.clone()).context("telemetry setup failed")?;

    config.validate().context("configuration rejected")?;

    let container = Container::new(config);
    info!("Signing core is running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    container.shutdown();
    info!("Shutdown complete");
    Ok(())
}
