//! Fetch failure taxonomy

use crate::provider::ProviderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a fetch: the value, or a classified failure
pub type FetchResult<T> = Result<T, FetchError>;

/// Stable failure kinds surfaced to the HTTP layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Required parameter missing or empty
    #[serde(rename = "validation_error")]
    Validation,
    /// Provider knows the keyword but has no data for it
    NotFound,
    /// Provider is throttling us; not retried here
    RateLimited,
    /// Provider unreachable or too slow, after retries
    UpstreamUnavailable,
    /// Any other provider failure
    UpstreamError,
}

impl FailureKind {
    /// HTTP status this kind is reported with
    pub fn status_code(self) -> u16 {
        match self {
            FailureKind::Validation => 400,
            FailureKind::NotFound => 404,
            FailureKind::RateLimited => 429,
            FailureKind::UpstreamUnavailable => 503,
            FailureKind::UpstreamError => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Validation => "validation_error",
            FailureKind::NotFound => "not_found",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::UpstreamUnavailable => "upstream_unavailable",
            FailureKind::UpstreamError => "upstream_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified fetch failure
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl From<ProviderError> for FetchError {
    fn from(err: ProviderError) -> Self {
        let kind = match &err {
            ProviderError::RateLimited(_) => FailureKind::RateLimited,
            ProviderError::ConnectionFailed(_) | ProviderError::Timeout(_) => {
                FailureKind::UpstreamUnavailable
            }
            ProviderError::Other(_) => FailureKind::UpstreamError,
        };
        Self::new(kind, err.to_string())
    }
}
