//! Logging configuration

use crate::logging::{LogFormat, LogLevel};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// off, error, warn, info, debug or trace
    /// Env: TG_LOG_LEVEL
    pub level: String,
    /// human, json or logfmt
    /// Env: TG_LOG_FORMAT
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string() }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("TG_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("TG_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.level.parse::<LogLevel>().context("Invalid logging.level")?;
        self.format.parse::<LogFormat>().context("Invalid logging.format")?;
        Ok(())
    }
}
