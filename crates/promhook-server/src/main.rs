//! promhook demo server
//!
//! Routes: /slow, /user/:slug, /error, /params/:param1/:param2, /sum/:a/:b
//! plus the metrics route from the config (default `/metrics`).

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use promhook_server::{attach, config, CachedMethod, MethodCache, PromPlugin};

const CONFIG_PATH: &str = "promhook.yaml";

#[derive(Clone)]
struct Demo {
    plugin: PromPlugin,
    sum: Arc<CachedMethod<i64>>,
}

#[derive(Serialize)]
struct Params {
    param1: String,
    param2: String,
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = if Path::new(CONFIG_PATH).exists() {
        config::load_from_file(CONFIG_PATH).expect("config load failed")
    } else {
        tracing::info!(path = CONFIG_PATH, "no config file, using defaults");
        config::PluginConfig::default()
    };
    let listen: SocketAddr = cfg.listen.parse().expect("listen must be a valid SocketAddr");

    let cache = Arc::new(MethodCache::new());
    let sum = Arc::new(
        cache
            .method::<i64>("sum", Duration::from_secs(5))
            .expect("method declared once"),
    );

    let plugin = PromPlugin::builder(cfg)
        .cache_source(cache)
        .build()
        .expect("metrics plugin setup failed");

    let demo = Demo {
        plugin: plugin.clone(),
        sum,
    };
    let app = Router::new()
        .route("/slow", get(slow))
        .route("/user/:slug", get(user))
        .route("/error", get(error))
        .route("/params/:param1/:param2", get(params))
        .route("/sum/:a/:b", get(sum_route))
        .with_state(demo);
    let app = attach(app, plugin.clone());

    tracing::info!(%listen, "promhook demo starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");
    plugin.start_cache_polling();

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .expect("server failed");

    plugin.shutdown();
}

async fn slow(State(demo): State<Demo>) -> String {
    // pseudo-random 0..3s, good enough to spread the buckets
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let delay = Duration::from_millis(u64::from(nanos % 3_000));

    let timer = demo.plugin.start_timer("slow_sleep");
    tokio::time::sleep(delay).await;
    let took = timer.stop();
    format!("slept {took:.3}s")
}

async fn user(State(demo): State<Demo>, UrlPath(slug): UrlPath<String>) -> String {
    demo.plugin.inc_counter("user_lookup");
    format!("hello {slug}")
}

async fn error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong")
}

async fn params(UrlPath((param1, param2)): UrlPath<(String, String)>) -> Json<Params> {
    Json(Params { param1, param2 })
}

async fn sum_route(
    State(demo): State<Demo>,
    UrlPath((a, b)): UrlPath<(i64, i64)>,
) -> Result<String, StatusCode> {
    let key = format!("{a}:{b}");
    demo.sum
        .call(&key, || a.checked_add(b).ok_or(StatusCode::BAD_REQUEST))
        .map(|v| v.to_string())
}
