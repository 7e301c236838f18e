use super::load_config;
use anyhow::Result;
use std::path::Path;

/// Print the effective configuration after file and environment overrides
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;
    print!("{}", config.to_toml()?);
    Ok(())
}
