//! Configuration system for Trendgate
//!
//! # Configuration Hierarchy
//!
//! Configuration values are resolved in the following order (highest priority wins):
//!
//! 1. **Command line** flags, applied by the binary
//! 2. **Environment Variables** - Override file config
//! 3. **Config File** (`trendgate.toml`) - Override defaults
//! 4. **Defaults** - Lowest priority
//!
//! Every section is optional in the file, and so is every field inside one.
//!
//! # Example
//!
//! ```no_run
//! use trendgate_core::config::TrendGateConfig;
//!
//! // Load with full supersedence
//! let config = TrendGateConfig::load()?;
//!
//! // Or load from specific file
//! let config = TrendGateConfig::from_file("trendgate.toml")?;
//!
//! // Or use defaults
//! let config = TrendGateConfig::default();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cache;
pub mod logging;
pub mod provider;
pub mod retry;
pub mod server;
pub mod throttle;

pub use cache::CacheConfig;
pub use logging::LoggingConfig;
pub use provider::ProviderConfig;
pub use retry::RetryConfig;
pub use server::ServerConfig;
pub use throttle::ThrottleConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

/// File read by [`TrendGateConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "trendgate.toml";

/// Complete Trendgate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendGateConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub throttle: ThrottleConfig,
    pub retry: RetryConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

impl TrendGateConfig {
    /// Load configuration with full supersedence chain
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (trendgate.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error: defaults and environment still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.server.merge(other.server);
        self.cache.merge(other.cache);
        self.throttle.merge(other.throttle);
        self.retry.merge(other.retry);
        self.provider.merge(other.provider);
        self.logging.merge(other.logging);
    }

    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.server.apply_env_vars();
        self.cache.apply_env_vars();
        self.throttle.apply_env_vars();
        self.retry.apply_env_vars();
        self.provider.apply_env_vars();
        self.logging.apply_env_vars();
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.cache.validate()?;
        self.throttle.validate()?;
        self.retry.validate()?;
        self.provider.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Parse an environment variable, ignoring (with a warning) values that don't parse
pub(crate) fn env_value<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

/// Boolean environment variable; accepts true/false, 1/0, yes/no, on/off
pub(crate) fn env_flag(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            log::warn!("Ignoring {}={:?}: not a boolean", name, raw);
            None
        }
    }
}
