use super::{init_logger, load_config};
use anyhow::Result;
use std::path::Path;
use trendgate_core::app::TrendGateServer;

/// Serve the HTTP API; flags override everything else
pub async fn run(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(config_path)?;
    init_logger(&config)?;

    let mut builder = TrendGateServer::with_config(config);
    if let Some(host) = host {
        builder = builder.with_host(host);
    }
    if let Some(port) = port {
        builder = builder.with_port(port);
    }

    builder.serve().await
}
