//! Request lifecycle hooks as an axum middleware.
//!
//! Responsibilities:
//! - Allocate a request id and call the pre-handler hook
//! - Call the post-response hook with method, matched route template and status
//! - Skip the metrics route entirely
//! - Forget the start record of a request whose future is dropped

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use promhook_core::RequestId;

use crate::plugin::{PromPlugin, UNMATCHED_ROUTE};

/// Discards the timing entry unless the request completed normally.
struct InFlight<'a> {
    plugin: &'a PromPlugin,
    id: RequestId,
    completed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.plugin.tracker().discard(self.id);
        }
    }
}

pub async fn track_requests(
    State(plugin): State<PromPlugin>,
    req: Request,
    next: Next,
) -> Response {
    if plugin.is_metrics_path(req.uri().path()) {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_owned();
    // route template, never the raw path (keeps label cardinality bounded)
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

    let id = plugin.tracker().next_id();
    plugin.on_request_start(id);
    let mut guard = InFlight {
        plugin: &plugin,
        id,
        completed: false,
    };

    let response = next.run(req).await;

    plugin.on_request_response(id, &method, &route, response.status().as_u16());
    guard.completed = true;
    response
}
