use std::sync::Arc;

use anyhow::Context;
use shipment_trace::{build_trace_service, init_logging, run, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    init_logging(&config.log);

    let service = build_trace_service(&config).context("failed to build lookup clients")?;
    run(&config.server, Arc::new(service)).await
}
