//! HTTP surface built on hyper
//!
//! - [`routes`] - endpoint handlers and [`AppState`]
//! - [`query`] - query-string parsing
//! - [`response`] - JSON responses and failure-to-status mapping
//!
//! The accept loop lives in [`crate::app`].

pub mod query;
pub mod response;
pub mod routes;

pub use response::{Resp, RespBody};
pub use routes::{handle_request, AppState};
