//! Builder pattern for TrendGateServer

use super::TrendGateServer;
use crate::config::TrendGateConfig;
use crate::fetch::FetchOrchestrator;
use crate::http::AppState;
use crate::provider::{GoogleTrendsProvider, TrendsProvider};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Builder for TrendGateServer
pub struct TrendGateServerBuilder {
    config: TrendGateConfig,
    provider: Option<Arc<dyn TrendsProvider>>,
}

impl TrendGateServerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::with_config(TrendGateConfig::default())
    }

    /// Create a builder with custom configuration
    pub fn with_config(config: TrendGateConfig) -> Self {
        Self { config, provider: None }
    }

    /// Set server port (overrides config file and env vars)
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set server host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Use this provider instead of Google Trends
    pub fn with_provider(mut self, provider: Arc<dyn TrendsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &TrendGateConfig {
        &self.config
    }

    /// Validate configuration and wire every component
    pub fn build(self) -> Result<TrendGateServer> {
        self.config.validate()?;

        let provider: Arc<dyn TrendsProvider> = match self.provider {
            Some(provider) => provider,
            None => Arc::new(
                GoogleTrendsProvider::new(self.config.provider.google_settings())
                    .context("Failed to create Google Trends client")?,
            ),
        };

        let orchestrator = Arc::new(FetchOrchestrator::from_config(&self.config, provider));
        let state = Arc::new(AppState::from_config(&self.config, orchestrator));

        Ok(TrendGateServer { config: self.config, state })
    }

    /// Build and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let server = self.build()?;
        server.serve().await
    }
}

impl Default for TrendGateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
