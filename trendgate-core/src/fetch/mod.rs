//! Fetch orchestration
//!
//! Cache check, cooldown, provider call with retry, cache population, and
//! the one place where provider failures are classified.

pub mod error;
pub mod inflight;
pub mod orchestrator;
pub mod retry;

pub use error::{FailureKind, FetchError, FetchResult};
pub use orchestrator::FetchOrchestrator;
pub use retry::RetryPolicy;
