use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use super::labels::{LabelSet, Schema};
use super::text::{write_header, write_sample, SeriesLabels};
use super::AtomicF64;

#[derive(Debug, Default)]
struct SummaryCell {
    sum: AtomicF64,
    count: AtomicU64,
}

/// Sum/count summary, used for timers.
#[derive(Debug)]
pub struct Summary {
    pub(crate) schema: Schema,
    series: DashMap<LabelSet, SummaryCell>,
}

impl Summary {
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

    /// Record one observation. NaN is dropped.
    pub fn observe(&self, labels: &[&str], value: f64) {
        if value.is_nan() {
            tracing::debug!(metric = %self.schema.name, "NaN observation dropped");
            return;
        }
        let Some(key) = self.schema.key(labels) else {
            return;
        };
        self.observe_key(key, value);
    }

    fn observe_key(&self, key: LabelSet, value: f64) {
        let record = |cell: &SummaryCell| {
            cell.sum.add(value);
            cell.count.fetch_add(1, Ordering::Relaxed);
        };
        if let Some(cell) = self.series.get(&key) {
            record(cell.value());
            return;
        }
        record(self.series.entry(key).or_insert_with(SummaryCell::default).value());
    }

    /// Start a timer bound to these labels. Nothing is recorded until
    /// [`SummaryTimer::stop`].
    pub fn start_timer(self: &Arc<Self>, labels: &[&str]) -> SummaryTimer {
        SummaryTimer {
            summary: Arc::clone(self),
            key: self.schema.key(labels),
            started: Instant::now(),
        }
    }

    /// `(sum, count)` of one series.
    pub fn get(&self, labels: &[&str]) -> Option<(f64, u64)> {
        if labels.len() != self.schema.label_names.len() {
            return None;
        }
        self.series
            .get(&LabelSet::new(labels))
            .map(|c| (c.sum.get(), c.count.load(Ordering::Relaxed)))
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn reset(&self) {
        self.series.clear();
    }

    pub(crate) fn render(&self, defaults: &[(String, String)], out: &mut String) {
        let name = &self.schema.name;
        write_header(out, name, &self.schema.help, "summary");

        let mut rows: Vec<(LabelSet, f64, u64)> = self
            .series
            .iter()
            .map(|r| {
                let c = r.value();
                (r.key().clone(), c.sum.get(), c.count.load(Ordering::Relaxed))
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, sum, count) in rows {
            let labels = SeriesLabels {
                defaults,
                names: &self.schema.label_names,
                values: key.values(),
            };
            write_sample(out, name, "_sum", &labels, None, sum);
            write_sample(out, name, "_count", &labels, None, count as f64);
        }
    }
}

/// Running timer for one summary series (monotonic clock).
#[derive(Debug)]
pub struct SummaryTimer {
    summary: Arc<Summary>,
    key: Option<LabelSet>,
    started: Instant,
}

impl SummaryTimer {
    /// Stop the timer, record the elapsed seconds and return them.
    pub fn stop(self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if let Some(key) = self.key {
            self.summary.observe_key(key, elapsed);
        }
        elapsed
    }
}
