//! Trends provider contract
//!
//! The provider is the only thing that talks to the outside world. The core
//! sees it as `fetch(keyword, geo, timeframe) -> payload | typed failure`;
//! whatever protocol sits behind that is the provider's business.

pub mod google;

pub use google::{GoogleTrendsProvider, GoogleTrendsSettings};

use serde::{Deserialize, Serialize};

/// Structured provider failure
///
/// Providers classify their own failures; callers never inspect the message
/// to decide what happened.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider is throttling us (HTTP 429 or equivalent)
    #[error("trends provider is rate limiting requests: {0}")]
    RateLimited(String),
    /// Could not reach the provider at all
    #[error("could not connect to trends provider: {0}")]
    ConnectionFailed(String),
    /// The provider did not answer in time
    #[error("trends provider timed out: {0}")]
    Timeout(String),
    /// Anything else: unexpected status, malformed payload, ...
    #[error("trends provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Worth retrying after a backoff
    ///
    /// Rate limiting is deliberately not transient: retrying into an active
    /// limit extends it.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::ConnectionFailed(_) | ProviderError::Timeout(_))
    }
}

/// One ranked entry of a related-queries list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedQuery {
    pub query: String,
    pub value: i64,
    /// Display form of `value` ("Breakout", "+250%", ...) when the provider sends one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_value: Option<String>,
}

impl RankedQuery {
    pub fn new(query: impl Into<String>, value: i64) -> Self {
        Self { query: query.into(), value, formatted_value: None }
    }
}

/// Related queries for one keyword
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedQueries {
    /// Most popular related queries
    pub top: Vec<RankedQuery>,
    /// Queries with the biggest recent growth
    pub rising: Vec<RankedQuery>,
}

impl RelatedQueries {
    /// The provider knows the keyword but has nothing related to report
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.rising.is_empty()
    }
}

/// One period of an interest-over-time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestPoint {
    pub date: chrono::NaiveDate,
    /// One value per keyword, in request order
    pub values: Vec<i64>,
    /// The period is still in progress
    pub is_partial: bool,
}

/// Interest over time for one or more keywords
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestTimeline {
    pub keywords: Vec<String>,
    pub points: Vec<InterestPoint>,
}

impl InterestTimeline {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Flatten into rows of `{date, <keyword>: value, ...}`
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.points
            .iter()
            .map(|point| {
                let mut row = serde_json::Map::new();
                row.insert("date".to_string(), point.date.format("%Y-%m-%d").to_string().into());
                for (keyword, value) in self.keywords.iter().zip(&point.values) {
                    row.insert(keyword.clone(), (*value).into());
                }
                serde_json::Value::Object(row)
            })
            .collect()
    }
}

/// External source of trend data
#[async_trait::async_trait]
pub trait TrendsProvider: Send + Sync {
    /// Related queries (top and rising) for a single keyword
    async fn related_queries(
        &self,
        keyword: &str,
        geo: &str,
        timeframe: &str,
    ) -> Result<RelatedQueries, ProviderError>;

    /// Interest over time for up to a handful of keywords compared together
    async fn interest_over_time(
        &self,
        keywords: &[String],
        geo: &str,
        timeframe: &str,
    ) -> Result<InterestTimeline, ProviderError>;
}
