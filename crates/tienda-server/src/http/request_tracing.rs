// SPDX-License-Identifier: Apache-2.0

use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tienda_api::{ApiError, ApiErrorEnvelope};
use tracing::{info, warn, Instrument};

const MAX_REQUEST_ID_LEN: usize = 128;

#[must_use]
pub(crate) fn request_id(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(ToString::to_string)
        .unwrap_or_else(|| {
            let id = state
                .request_id_seed
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            format!("req-{id:016x}")
        })
}

/// Re-renders an error body produced further down with the request id.
fn stamp_request_id(response: &mut Response, request_id: &str) {
    let Some(err) = response.extensions_mut().remove::<ApiError>() else {
        return;
    };
    let envelope = ApiErrorEnvelope {
        error: err.with_request_id(request_id),
    };
    match serde_json::to_vec(&envelope) {
        Ok(bytes) => {
            response.headers_mut().remove(header::CONTENT_LENGTH);
            *response.body_mut() = Body::from(bytes);
        }
        Err(e) => warn!(error = %e, "failed to re-encode error body"),
    }
}

pub(crate) async fn request_tracing_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let route = request.uri().path().to_string();
    let request_id = request_id(request.headers(), &state);

    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route,
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    stamp_request_id(&mut response, &request_id);
    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );
    });
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerConfig;
    use tienda_store::{Store, StoreConfig};

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(StoreConfig {
            path: dir.path().join("t.sqlite"),
            ..StoreConfig::default()
        })
        .expect("store");
        (dir, AppState::new(store, ServerConfig::default()))
    }

    #[test]
    fn propagates_or_generates_request_id() {
        let (_dir, state) = state();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("req-abc"));
        assert_eq!(request_id(&headers, &state), "req-abc");

        let generated = request_id(&HeaderMap::new(), &state);
        assert!(generated.starts_with("req-"));
        assert_eq!(generated.len(), 4 + 16);
        assert_ne!(generated, request_id(&HeaderMap::new(), &state));
    }

    #[test]
    fn error_bodies_get_the_request_id() {
        let mut response = crate::error::api_error_response(ApiError::not_found("product not found"));
        stamp_request_id(&mut response, "req-42");
        assert!(response.extensions().get::<ApiError>().is_none());
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    }
}
