//! Server configuration

use super::env_value;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server listening address
    /// Env: TG_HOST
    /// Default: "0.0.0.0"
    pub host: String,

    /// Server listening port
    /// Env: TG_PORT, then PORT
    /// Default: 8080
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl ServerConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(host) = env::var("TG_HOST") {
            self.host = host;
        }

        // PORT is what most container platforms inject
        if let Some(port) = env_value("TG_PORT").or_else(|| env_value("PORT")) {
            self.port = port;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            bail!("Invalid host: host cannot be empty");
        }

        if self.port == 0 {
            bail!("Invalid port: port must be between 1 and 65535");
        }

        Ok(())
    }

    /// `host:port` for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
