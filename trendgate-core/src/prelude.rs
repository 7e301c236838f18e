//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use trendgate_core::prelude::*;
//! ```

// === Server builder ===
pub use crate::app::{TrendGateServer, TrendGateServerBuilder};

// === Configuration and logging ===
pub use crate::config::TrendGateConfig;
pub use crate::logging::{init_logging, LogFormat, LogLevel, LogSettings};

// === Core components ===
pub use crate::cache::{CacheKey, CacheStore};
pub use crate::fetch::{FailureKind, FetchError, FetchOrchestrator, FetchResult, RetryPolicy};
pub use crate::throttle::CooldownGate;

// === Provider contract ===
pub use crate::provider::{
    GoogleTrendsProvider, InterestTimeline, ProviderError, RankedQuery, RelatedQueries,
    TrendsProvider,
};
