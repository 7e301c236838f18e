//! Request routing and endpoint handlers
//!
//! | Method | Path               | Response                                        |
//! |--------|--------------------|-------------------------------------------------|
//! | GET    | `/health`          | `{ok: true}`                                    |
//! | GET    | `/trends/related`  | `{query, geo, related_queries: {top, rising}}`  |
//! | GET    | `/trends/interest` | `{records: [{date, <keyword>: n, ...}]}`        |
//!
//! Several comma-separated keywords on `/trends/related` return
//! `{geo, results: {<keyword>: {related_queries} | {error, kind}}}`.

use super::query::{query_param, split_keywords};
use super::response::{
    fetch_error_response, json_response, method_not_allowed_response, not_found_response, Resp,
};
use crate::config::TrendGateConfig;
use crate::fetch::{FetchError, FetchOrchestrator};
use hyper::{Method, Request, StatusCode};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

/// Everything a request handler needs
pub struct AppState {
    pub orchestrator: Arc<FetchOrchestrator>,
    /// Region used when `geo` is absent or blank
    pub default_geo: String,
    /// Time range sent to the provider for every query
    pub timeframe: String,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<FetchOrchestrator>,
        default_geo: impl Into<String>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self { orchestrator, default_geo: default_geo.into(), timeframe: timeframe.into() }
    }

    pub fn from_config(config: &TrendGateConfig, orchestrator: Arc<FetchOrchestrator>) -> Self {
        Self::new(orchestrator, &config.provider.default_geo, &config.provider.timeframe)
    }

    fn geo_from(&self, query: &str) -> String {
        query_param(query, "geo")
            .map(|geo| geo.trim().to_string())
            .filter(|geo| !geo.is_empty())
            .unwrap_or_else(|| self.default_geo.clone())
    }
}

/// Entry point for every HTTP request
///
/// Generic over the body because no endpoint reads one.
pub async fn handle_request<B>(req: Request<B>, state: Arc<AppState>) -> Result<Resp, Infallible> {
    let start = Instant::now();
    let (parts, _) = req.into_parts();
    let path = parts.uri.path();
    let query = parts.uri.query().unwrap_or("");

    let resp = route(&parts.method, path, query, &state).await;

    log::info!(
        "{} {} -> {} ({} ms)",
        parts.method,
        parts.uri,
        resp.status().as_u16(),
        start.elapsed().as_millis()
    );
    Ok(resp)
}

async fn route(method: &Method, path: &str, query: &str, state: &AppState) -> Resp {
    let known = matches!(path, "/health" | "/trends/related" | "/trends/interest");
    if !known {
        return not_found_response(path);
    }
    if *method != Method::GET {
        return method_not_allowed_response();
    }

    match path {
        "/health" => json_response(StatusCode::OK, &json!({ "ok": true })),
        "/trends/related" => related(query, state).await,
        _ => interest(query, state).await,
    }
}

/// Keywords from `q`, or the validation failure for a missing one
fn keywords_from(query: &str) -> Result<Vec<String>, FetchError> {
    let keywords = split_keywords(&query_param(query, "q").unwrap_or_default());
    if keywords.is_empty() {
        return Err(FetchError::validation("Missing q param"));
    }
    Ok(keywords)
}

async fn related(query: &str, state: &AppState) -> Resp {
    let keywords = match keywords_from(query) {
        Ok(keywords) => keywords,
        Err(err) => return fetch_error_response(&err),
    };
    let geo = state.geo_from(query);
    let orchestrator = &state.orchestrator;

    if let [keyword] = keywords.as_slice() {
        return match orchestrator.fetch_related(keyword, &geo, &state.timeframe).await {
            Ok(related) => json_response(
                StatusCode::OK,
                &json!({ "query": keyword, "geo": geo, "related_queries": related }),
            ),
            Err(err) => fetch_error_response(&err),
        };
    }

    // Independent keys, so each goes through its own cache entry and cooldown
    let fetches = keywords
        .iter()
        .map(|keyword| orchestrator.fetch_related(keyword, &geo, &state.timeframe));
    let outcomes = futures::future::join_all(fetches).await;

    let mut results = serde_json::Map::new();
    for (keyword, outcome) in keywords.iter().zip(outcomes) {
        let entry = match outcome {
            Ok(related) => json!({ "related_queries": related }),
            Err(err) => json!({ "error": err.message, "kind": err.kind.as_str() }),
        };
        results.insert(keyword.clone(), entry);
    }

    json_response(StatusCode::OK, &json!({ "geo": geo, "results": results }))
}

async fn interest(query: &str, state: &AppState) -> Resp {
    let keywords = match keywords_from(query) {
        Ok(keywords) => keywords,
        Err(err) => return fetch_error_response(&err),
    };
    let geo = state.geo_from(query);

    match state.orchestrator.fetch_interest(&keywords, &geo, &state.timeframe).await {
        Ok(timeline) => json_response(StatusCode::OK, &json!({ "records": timeline.records() })),
        Err(err) => fetch_error_response(&err),
    }
}
