//! Axum router wiring.
//!
//! Adds the metrics route to a host router and wraps every route with the
//! timing middleware.

use axum::{middleware, routing::get, Router};

use crate::{middleware::track_requests, ops, plugin::PromPlugin};

/// Attach metrics to `router`. The host must not define its own route at
/// `metrics_path`.
pub fn attach(router: Router, plugin: PromPlugin) -> Router {
    let metrics = Router::new()
        .route(&plugin.cfg().metrics_path, get(ops::metrics))
        .with_state(plugin.clone());

    router
        .merge(metrics)
        .layer(middleware::from_fn_with_state(plugin, track_requests))
}
