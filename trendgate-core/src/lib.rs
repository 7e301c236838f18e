//! Trendgate - Core
//!
//! A caching, throttling front for a rate-limited trends provider.
//!
//! # Overview
//!
//! Trendgate sits between HTTP clients and an unreliable upstream that
//! answers "what do people search for alongside this keyword?". It keeps
//! load on the upstream low and smooths over its failures:
//!
//! - a bounded FIFO cache with TTL, keyed by (keyword, region)
//! - a per-key cooldown that spaces out upstream attempts for the same key
//! - retry with exponential backoff for transient failures only
//! - a stable failure taxonomy mapped to HTTP statuses
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trendgate_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TrendGateConfig::load()?;
//!     init_logging(&LogSettings::from_config(&config.logging)?)?;
//!
//!     TrendGateServer::with_config(config).serve().await
//! }
//! ```
//!
//! # Architecture
//!
//! - [`cache`] - `CacheStore`, the FIFO + TTL cache
//! - [`throttle`] - `CooldownGate`, the per-key minimum-interval throttle
//! - [`provider`] - the `TrendsProvider` contract and the Google Trends client
//! - [`fetch`] - `FetchOrchestrator`, retry policy and failure taxonomy
//! - [`http`] - routes and JSON responses
//! - [`app`] - server wiring and the accept loop
//! - [`config`] - TOML + environment configuration
//! - [`logging`] - `log` backend

pub mod app;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod http;
pub mod logging;
pub mod provider;
pub mod throttle;

// Prelude module for convenient imports
pub mod prelude;

// Re-exports of main types and traits
pub use app::{TrendGateServer, TrendGateServerBuilder};
pub use cache::{CacheKey, CacheStore};
pub use config::TrendGateConfig;
pub use fetch::{FailureKind, FetchError, FetchOrchestrator, FetchResult, RetryPolicy};
pub use provider::{ProviderError, RelatedQueries, TrendsProvider};
pub use throttle::CooldownGate;
