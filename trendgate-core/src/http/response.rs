//! JSON response helpers for hyper

use crate::fetch::{FailureKind, FetchError};
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde_json::json;
use std::convert::Infallible;

pub type RespBody = BoxBody<Bytes, Infallible>;
pub type Resp = Response<RespBody>;

/// Create a response body from any data that can be converted to Bytes
pub fn body_from<T: Into<Bytes>>(data: T) -> RespBody {
    Full::new(data.into()).boxed()
}

/// Serialize `value` as the body of a JSON response
pub fn json_response(status: StatusCode, value: &serde_json::Value) -> Resp {
    let mut resp = Response::new(body_from(value.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

/// `{error, kind}` with the status the failure kind maps to
pub fn fetch_error_response(err: &FetchError) -> Resp {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, &json!({ "error": err.message, "kind": err.kind.as_str() }))
}

/// `{error, kind}` for failures the fetch path never sees
pub fn json_error_response(status: StatusCode, kind: &str, message: &str) -> Resp {
    json_response(status, &json!({ "error": message, "kind": kind }))
}

pub fn not_found_response(path: &str) -> Resp {
    json_error_response(StatusCode::NOT_FOUND, FailureKind::NotFound.as_str(), &format!("No route for {}", path))
}

pub fn method_not_allowed_response() -> Resp {
    let mut resp = json_error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "Only GET is supported",
    );
    resp.headers_mut().insert(hyper::header::ALLOW, HeaderValue::from_static("GET"));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Resp) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_error_maps_status_and_kind() {
        let resp = fetch_error_response(&FetchError::new(FailureKind::RateLimited, "slow down"));

        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body_json(resp).await, json!({"error": "slow down", "kind": "rate_limited"}));
    }

    #[tokio::test]
    async fn test_method_not_allowed_advertises_get() {
        let resp = method_not_allowed_response();

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[hyper::header::ALLOW], "GET");
        assert_eq!(body_json(resp).await["kind"], "method_not_allowed");
    }
}
