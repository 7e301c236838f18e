//! Trends provider configuration

use super::env_value;
use crate::provider::GoogleTrendsSettings;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Upstream provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider scheme and host
    /// Env: TG_PROVIDER_URL
    /// Default: "https://trends.google.com"
    pub base_url: String,

    /// Interface language sent with every request
    /// Env: TG_PROVIDER_HL, then PYTRENDS_HL
    /// Default: "en-US"
    pub host_language: String,

    /// Timezone offset in minutes
    /// Env: TG_PROVIDER_TZ, then PYTRENDS_TZ
    /// Default: 0
    pub tz_offset: i32,

    /// Region used when a request names none
    /// Env: TG_DEFAULT_GEO
    /// Default: "US"
    pub default_geo: String,

    /// Time range for every query
    /// Env: TG_TIMEFRAME
    /// Default: "today 12-m"
    pub timeframe: String,

    /// Env: TG_CONNECT_TIMEOUT
    /// Default: 10
    pub connect_timeout_seconds: u64,

    /// Env: TG_REQUEST_TIMEOUT
    /// Default: 25
    pub request_timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trends.google.com".to_string(),
            host_language: "en-US".to_string(),
            tz_offset: 0,
            default_geo: "US".to_string(),
            timeframe: "today 12-m".to_string(),
            connect_timeout_seconds: 10,
            request_timeout_seconds: 25,
        }
    }
}

impl ProviderConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(url) = env::var("TG_PROVIDER_URL") {
            self.base_url = url;
        }

        if let Ok(hl) = env::var("TG_PROVIDER_HL").or_else(|_| env::var("PYTRENDS_HL")) {
            self.host_language = hl;
        }

        if let Some(tz) = env_value("TG_PROVIDER_TZ").or_else(|| env_value("PYTRENDS_TZ")) {
            self.tz_offset = tz;
        }

        if let Ok(geo) = env::var("TG_DEFAULT_GEO") {
            self.default_geo = geo;
        }

        if let Ok(timeframe) = env::var("TG_TIMEFRAME") {
            self.timeframe = timeframe;
        }

        if let Some(timeout) = env_value("TG_CONNECT_TIMEOUT") {
            self.connect_timeout_seconds = timeout;
        }

        if let Some(timeout) = env_value("TG_REQUEST_TIMEOUT") {
            self.request_timeout_seconds = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("Invalid base_url: provider URL cannot be empty");
        }

        if self.request_timeout_seconds == 0 {
            bail!("Invalid request_timeout_seconds: must be greater than 0");
        }

        if self.timeframe.trim().is_empty() {
            bail!("Invalid timeframe: cannot be empty");
        }

        Ok(())
    }

    /// Connection settings for the Google Trends client
    pub fn google_settings(&self) -> GoogleTrendsSettings {
        GoogleTrendsSettings {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            host_language: self.host_language.clone(),
            tz_offset: self.tz_offset,
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}
