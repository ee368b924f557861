//! promhook core: runtime-free metric instruments and their text exposition.
//!
//! This crate owns the aggregation state (counters, histograms, summaries),
//! the per-request duration tracker and the cumulative-to-delta table used by
//! the cache poller. It carries no HTTP or async runtime dependencies so the
//! same registry can be driven by any host.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Invalid samples are
//! dropped, configuration mistakes surface as `PromError` at setup time, and
//! rendering never fails.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod cache;
pub mod error;
pub mod metrics;
pub mod process;
pub mod timing;

/// Shared result type.
pub use error::{PromError, Result};
pub use metrics::{
    Collector, Counter, Histogram, HistogramSnapshot, LabelSet, MetricRegistry, Summary,
    SummaryTimer, TEXT_CONTENT_TYPE,
};
pub use timing::{DurationTracker, RequestId};
