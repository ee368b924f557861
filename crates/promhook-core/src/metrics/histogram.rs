use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::error::{PromError, Result};

use super::labels::{LabelSet, Schema};
use super::text::{fmt_value, write_header, write_sample, SeriesLabels};
use super::AtomicF64;

/// Per-series state.
///
/// `slots[i]` counts observations that landed in bucket `i` only (the first
/// bound `>= value`); the last slot is the `+Inf` overflow. Cumulative counts
/// are prefix sums taken at read time, so a reader always sees non-decreasing
/// buckets whose `+Inf` equals `_count`, whatever concurrent writers do.
#[derive(Debug)]
struct HistogramCell {
    slots: Box<[AtomicU64]>,
    sum: AtomicF64,
}

impl HistogramCell {
    fn new(bounds: usize) -> Self {
        Self {
            slots: (0..=bounds).map(|_| AtomicU64::new(0)).collect(),
            sum: AtomicF64::new(0.0),
        }
    }

    fn snapshot(&self, bounds: &[f64]) -> HistogramSnapshot {
        let mut acc = 0u64;
        let mut buckets = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.iter().enumerate() {
            acc += slot.load(Ordering::Relaxed);
            let le = bounds.get(i).copied().unwrap_or(f64::INFINITY);
            buckets.push((le, acc));
        }
        HistogramSnapshot {
            buckets,
            sum: self.sum.get(),
            count: acc,
        }
    }
}

/// Point-in-time view of one histogram series.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    /// `(upper bound, cumulative count)`, ascending, ending with `+Inf`.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

/// Cumulative histogram with fixed bucket bounds.
#[derive(Debug)]
pub struct Histogram {
    pub(crate) schema: Schema,
    bounds: Box<[f64]>,
    series: DashMap<LabelSet, HistogramCell>,
}

impl Histogram {
    pub(crate) fn new(schema: Schema, bounds: Box<[f64]>) -> Self {
        Self {
            schema,
            bounds,
            series: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn label_names(&self) -> &[String] {
        &self.schema.label_names
    }

    /// Finite upper bounds; `+Inf` is implicit.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Record one observation. NaN is dropped.
    pub fn observe(&self, labels: &[&str], value: f64) {
        if value.is_nan() {
            tracing::debug!(metric = %self.schema.name, "NaN observation dropped");
            return;
        }
        let Some(key) = self.schema.key(labels) else {
            return;
        };

        let slot = self.bounds.partition_point(|b| *b < value);
        let record = |cell: &HistogramCell| {
            cell.sum.add(value);
            cell.slots[slot].fetch_add(1, Ordering::Relaxed);
        };

        if let Some(cell) = self.series.get(&key) {
            record(cell.value());
            return;
        }
        let cell = self
            .series
            .entry(key)
            .or_insert_with(|| HistogramCell::new(self.bounds.len()));
        record(cell.value());
    }

    pub fn snapshot(&self, labels: &[&str]) -> Option<HistogramSnapshot> {
        if labels.len() != self.schema.label_names.len() {
            return None;
        }
        self.series
            .get(&LabelSet::new(labels))
            .map(|cell| cell.snapshot(&self.bounds))
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn reset(&self) {
        self.series.clear();
    }

    pub(crate) fn same_schema(&self, other: &Schema, bounds: &[f64]) -> bool {
        self.schema.same_labels(other) && *self.bounds == *bounds
    }

    pub(crate) fn render(&self, defaults: &[(String, String)], out: &mut String) {
        let name = &self.schema.name;
        write_header(out, name, &self.schema.help, "histogram");

        let mut rows: Vec<(LabelSet, HistogramSnapshot)> = self
            .series
            .iter()
            .map(|r| (r.key().clone(), r.value().snapshot(&self.bounds)))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, snap) in rows {
            let labels = SeriesLabels {
                defaults,
                names: &self.schema.label_names,
                values: key.values(),
            };
            for (le, count) in &snap.buckets {
                let bound = fmt_value(*le);
                let extra = Some(("le", bound.as_str()));
                write_sample(out, name, "_bucket", &labels, extra, *count as f64);
            }
            write_sample(out, name, "_sum", &labels, None, snap.sum);
            write_sample(out, name, "_count", &labels, None, snap.count as f64);
        }
    }
}

/// Validate bucket bounds: non-empty, finite, strictly ascending.
/// A trailing `+Inf` is accepted and dropped since it is always implicit.
pub(crate) fn validate_buckets(metric: &str, buckets: &[f64]) -> Result<Box<[f64]>> {
    let trimmed = match buckets.split_last() {
        Some((last, rest)) if *last == f64::INFINITY => rest,
        _ => buckets,
    };

    let invalid = |reason| PromError::InvalidBuckets {
        metric: metric.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("at least one finite bucket is required"));
    }
    if trimmed.iter().any(|b| !b.is_finite()) {
        return Err(invalid("bucket bounds must be finite"));
    }
    if trimmed.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("bucket bounds must be strictly ascending"));
    }
    Ok(trimmed.into())
}
