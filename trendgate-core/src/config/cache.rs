//! Response cache configuration

use super::env_value;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds an entry stays fresh; 0 disables caching
    /// Env: TG_CACHE_TTL
    pub ttl_seconds: u64,

    /// Entries kept before the oldest insertion is evicted; 0 disables caching
    /// Env: TG_CACHE_MAX_ITEMS
    pub max_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 3600, max_items: 300 }
    }
}

impl CacheConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Some(ttl) = env_value("TG_CACHE_TTL") {
            self.ttl_seconds = ttl;
        }
        if let Some(max_items) = env_value("TG_CACHE_MAX_ITEMS") {
            self.max_items = max_items;
        }
    }

    pub fn validate(&self) -> Result<()> {
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn enabled(&self) -> bool {
        self.ttl_seconds > 0 && self.max_items > 0
    }
}
