use dashmap::DashMap;

use super::labels::{LabelSet, Schema};
use super::text::{write_header, write_sample, SeriesLabels};
use super::AtomicF64;

/// Monotonic counter partitioned by label values.
#[derive(Debug)]
pub struct Counter {
    pub(crate) schema: Schema,
    series: DashMap<LabelSet, AtomicF64>,
}

impl Counter {
    pub(crate) fn new(schema: Schema) -> Self {
        Self {
            schema,
            series: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn label_names(&self) -> &[String] {
        &self.schema.label_names
    }

    /// Increment by 1.
    pub fn inc_one(&self, labels: &[&str]) {
        self.inc(labels, 1.0);
    }

    /// Increment by `delta`.
    ///
    /// Negative, NaN and infinite deltas are dropped: a counter never goes
    /// backwards. A zero delta is valid and materializes the series.
    pub fn inc(&self, labels: &[&str], delta: f64) {
        if !delta.is_finite() || delta < 0.0 {
            tracing::debug!(metric = %self.schema.name, delta, "invalid counter delta dropped");
            return;
        }
        let Some(key) = self.schema.key(labels) else {
            return;
        };

        if let Some(v) = self.series.get(&key) {
            v.add(delta);
            return;
        }
        self.series
            .entry(key)
            .or_insert_with(|| AtomicF64::new(0.0))
            .add(delta);
    }

    /// Current value, 0 for a label combination never seen.
    pub fn get(&self, labels: &[&str]) -> f64 {
        if labels.len() != self.schema.label_names.len() {
            return 0.0;
        }
        self.series
            .get(&LabelSet::new(labels))
            .map(|v| v.get())
            .unwrap_or(0.0)
    }

    /// Number of materialized series.
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Drop every series.
    pub fn reset(&self) {
        self.series.clear();
    }

    pub(crate) fn render(&self, defaults: &[(String, String)], out: &mut String) {
        write_header(out, &self.schema.name, &self.schema.help, "counter");

        let mut rows: Vec<(LabelSet, f64)> = self
            .series
            .iter()
            .map(|r| (r.key().clone(), r.value().get()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, value) in rows {
            let labels = SeriesLabels {
                defaults,
                names: &self.schema.label_names,
                values: key.values(),
            };
            write_sample(out, &self.schema.name, "", &labels, None, value);
        }
    }
}
