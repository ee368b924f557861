//! Label-partitioned metric instruments and the registry that renders them.
//!
//! Instruments keep one accumulator per label combination in a `DashMap`;
//! combinations materialize lazily on first update. Scalars are atomics, so
//! concurrent updates never lose increments and never block for long.
//!
//! Label cardinality is the caller's responsibility: feed route templates, not
//! raw paths with embedded ids.

mod counter;
mod histogram;
mod labels;
mod registry;
mod summary;
mod text;

use std::sync::atomic::{AtomicU64, Ordering};

pub use counter::Counter;
pub use histogram::{Histogram, HistogramSnapshot};
pub use labels::LabelSet;
pub use registry::{Collector, MetricKind, MetricRegistry, Sample};
pub use summary::{Summary, SummaryTimer};

/// Content type of the text exposition format produced by [`MetricRegistry::render`].
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `f64` stored as raw bits, updated with a CAS loop.
#[derive(Debug, Default)]
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    pub(crate) fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn add(&self, delta: f64) {
        // The closure never returns None, so the update cannot fail.
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }
}
