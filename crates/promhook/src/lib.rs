//! promhook: Prometheus instrumentation for axum services.
//!
//! Facade over the workspace crates:
//! - [`core`]: metric instruments, registry and text exposition (no runtime deps)
//! - [`server`]: config, request middleware, metrics route and cache poller
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use promhook::{attach, PluginConfig, PromPlugin};
//!
//! # async fn run() -> promhook::Result<()> {
//! let plugin = PromPlugin::new(PluginConfig::default())?;
//! let app = attach(Router::new().route("/", get(|| async { "ok" })), plugin.clone());
//! # let _ = app;
//! plugin.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod core {
    pub use promhook_core::*;
}

pub mod server {
    pub use promhook_server::*;
}

pub use promhook_core::{PromError, Result};
pub use promhook_server::config::PluginConfig;
pub use promhook_server::{attach, BearerToken, MetricsAuth, PromPlugin, PromPluginBuilder};
