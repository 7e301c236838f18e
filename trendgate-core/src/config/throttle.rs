//! Upstream throttling configuration

use super::{env_flag, env_value};
use crate::throttle::cooldown::DEFAULT_MAX_TRACKED_KEYS;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum spacing between provider attempts for one key
    /// Env: TG_COOLDOWN_SECONDS
    /// Default: 5
    pub cooldown_seconds: u64,

    /// Cooldown records kept before idle ones are swept
    /// Env: TG_COOLDOWN_MAX_KEYS
    /// Default: 10000
    pub max_tracked_keys: usize,

    /// Let concurrent misses for one key share a provider call
    /// Env: TG_COALESCE_REQUESTS
    /// Default: true
    pub coalesce_requests: bool,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 5,
            max_tracked_keys: DEFAULT_MAX_TRACKED_KEYS,
            coalesce_requests: true,
        }
    }
}

impl ThrottleConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Some(seconds) = env_value("TG_COOLDOWN_SECONDS") {
            self.cooldown_seconds = seconds;
        }
        if let Some(max_keys) = env_value("TG_COOLDOWN_MAX_KEYS") {
            self.max_tracked_keys = max_keys;
        }
        if let Some(coalesce) = env_flag("TG_COALESCE_REQUESTS") {
            self.coalesce_requests = coalesce;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tracked_keys == 0 {
            bail!("Invalid max_tracked_keys: must be at least 1");
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}
