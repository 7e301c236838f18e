//! Provider retry configuration

use super::env_value;
use crate::fetch::RetryPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total provider attempts for transient failures, first included
    /// Env: TG_MAX_RETRIES
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled after each failure
    /// Env: TG_BACKOFF_BASE_MS
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, backoff_base_ms: 1000 }
    }
}

impl RetryConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Some(retries) = env_value("TG_MAX_RETRIES") {
            self.max_retries = retries;
        }
        if let Some(base) = env_value("TG_BACKOFF_BASE_MS") {
            self.backoff_base_ms = base;
        }
    }

    pub fn validate(&self) -> Result<()> {
        Ok(())
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.backoff_base_ms))
    }
}
