//! promhook server integration.
//!
//! Wires the core instruments into an axum host: strict YAML config, the
//! request timing middleware, the metrics route, the cache poller, and a
//! small memoizing method cache. Consumed by the demo binary (`main.rs`) and
//! by integration tests.

pub mod cache;
pub mod config;
pub mod middleware;
pub mod ops;
pub mod plugin;
pub mod poller;
pub mod router;

pub use cache::{CacheStatsSource, CachedMethod, MethodCache};
pub use ops::{BearerToken, MetricsAuth};
pub use plugin::{PromPlugin, PromPluginBuilder, UNMATCHED_ROUTE};
pub use poller::CachePoller;
pub use router::attach;
