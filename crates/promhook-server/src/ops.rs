//! Metrics exposition endpoint.
//!
//! `GET <metrics_path>` : Prometheus text format, optionally behind an authorizer.
//! The route is never timed by the request middleware.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use promhook_core::TEXT_CONTENT_TYPE;

use crate::plugin::PromPlugin;

/// Access check for the metrics route, supplied by the host.
pub trait MetricsAuth: Send + Sync {
    fn authorize(&self, headers: &HeaderMap) -> bool;
}

/// Static `Authorization: Bearer <token>` check (`auth.bearer_token`).
pub struct BearerToken {
    expected: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            expected: format!("Bearer {}", token.into()),
        }
    }
}

impl MetricsAuth for BearerToken {
    fn authorize(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == self.expected)
    }
}

pub async fn metrics(State(plugin): State<PromPlugin>, headers: HeaderMap) -> Response {
    if let Some(auth) = plugin.auth() {
        if !auth.authorize(&headers) {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }

    let body = plugin.render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
        body,
    )
        .into_response()
}
