//! Per-request duration capture.
//!
//! Start instants come from the monotonic clock so wall-clock adjustments
//! never produce negative or skewed durations. Entries live only while their
//! request is in flight.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Identity of one in-flight request, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[derive(Debug)]
pub struct DurationTracker {
    seq: AtomicU64,
    started: DashMap<RequestId, Instant>,
}

impl Default for DurationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationTracker {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(1),
            started: DashMap::new(),
        }
    }

    /// Allocate a fresh request identity.
    pub fn next_id(&self) -> RequestId {
        RequestId(self.seq.fetch_add(1, Ordering::Relaxed))
    }

    /// Record the start of `id`. A second `begin` for the same id restarts it.
    pub fn begin(&self, id: RequestId) {
        self.started.insert(id, Instant::now());
    }

    /// Consume the start record of `id` and return the elapsed time.
    /// `None` when `begin` was never called for it (e.g. the metrics route).
    pub fn end(&self, id: RequestId) -> Option<Duration> {
        self.started.remove(&id).map(|(_, at)| at.elapsed())
    }

    /// Forget `id` without measuring (request dropped before completion).
    pub fn discard(&self, id: RequestId) {
        self.started.remove(&id);
    }

    pub fn in_flight(&self) -> usize {
        self.started.len()
    }
}
