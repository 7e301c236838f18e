pub mod config;
pub mod fetch;
pub mod serve;

use anyhow::Result;
use std::path::Path;
use trendgate_core::config::{TrendGateConfig, DEFAULT_CONFIG_FILE};
use trendgate_core::logging::{init_logging, LogSettings};

/// Defaults, then the file, then the environment
///
/// An explicitly named file has to exist; the default one is optional.
pub fn load_config(path: Option<&Path>) -> Result<TrendGateConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            TrendGateConfig::load_from(path)?
        }
        None => TrendGateConfig::load_from(DEFAULT_CONFIG_FILE)?,
    };
    Ok(config)
}

/// Install the logger described by the `[logging]` section
pub fn init_logger(config: &TrendGateConfig) -> Result<()> {
    let settings =
        LogSettings::from_config(&config.logging)?.with_context_field("service", "trendgate");
    init_logging(&settings)
}
