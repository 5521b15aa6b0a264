//! Guard node entry point.

use anyhow::{Context, Result};
use guard_node::settings::NodeSettings;
use guard_node::telemetry::{init_logging, TelemetryConfig};
use guard_node::GuardNode;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::from_env()).context("failed to initialise logging")?;

    let settings = NodeSettings::from_env();
    let node = GuardNode::start(&settings).await?;

    info!("Guard node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    node.shutdown().await;
    Ok(())
}
