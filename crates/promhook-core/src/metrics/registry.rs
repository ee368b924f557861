use std::sync::{Arc, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{PromError, Result};

use super::counter::Counter;
use super::histogram::{validate_buckets, Histogram};
use super::labels::{valid_label_name, Schema};
use super::summary::Summary;
use super::text::{write_header, write_sample, SeriesLabels};

/// Exposition type of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
        }
    }
}

/// One unlabeled value produced by a [`Collector`] at render time.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub value: f64,
}

/// Source of values computed on demand at render time (process stats, ...).
pub trait Collector: Send + Sync {
    fn collect(&self) -> Vec<Sample>;
}

#[derive(Debug, Clone)]
enum Family {
    Counter(Arc<Counter>),
    Histogram(Arc<Histogram>),
    Summary(Arc<Summary>),
}

impl Family {
    fn render(&self, defaults: &[(String, String)], out: &mut String) {
        match self {
            Family::Counter(c) => c.render(defaults, out),
            Family::Histogram(h) => h.render(defaults, out),
            Family::Summary(s) => s.render(defaults, out),
        }
    }
}

/// Owns every metric family of one host instance.
///
/// Registration is idempotent per name; re-registering a name with another
/// kind or label schema is a setup error. Handles are `Arc`s that stay valid
/// for as long as the caller keeps them.
pub struct MetricRegistry {
    families: DashMap<String, Family>,
    collectors: RwLock<Vec<Box<dyn Collector>>>,
    default_labels: Box<[(String, String)]>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            families: DashMap::new(),
            collectors: RwLock::new(Vec::new()),
            default_labels: Box::new([]),
        }
    }

    /// Registry whose every series carries these static labels.
    pub fn with_default_labels<I, K, V>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (k, v) in labels {
            let k = k.into();
            if !valid_label_name(&k) || pairs.iter().any(|(n, _)| *n == k) {
                return Err(PromError::InvalidLabel {
                    metric: "default_labels".into(),
                    label: k,
                });
            }
            pairs.push((k, v.into()));
        }
        Ok(Self {
            default_labels: pairs.into_boxed_slice(),
            ..Self::new()
        })
    }

    pub fn default_labels(&self) -> &[(String, String)] {
        &self.default_labels
    }

    pub fn register_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Arc<Counter>> {
        let schema = Schema::new(name, help, label_names, &self.default_labels, false)?;
        match self.families.entry(name.to_string()) {
            Entry::Occupied(e) => match e.get() {
                Family::Counter(c) if c.schema.same_labels(&schema) => Ok(Arc::clone(c)),
                _ => Err(PromError::Conflict(name.to_string())),
            },
            Entry::Vacant(e) => {
                let counter = Arc::new(Counter::new(schema));
                e.insert(Family::Counter(Arc::clone(&counter)));
                tracing::debug!(metric = %name, "counter registered");
                Ok(counter)
            }
        }
    }

    pub fn register_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<Arc<Histogram>> {
        let schema = Schema::new(name, help, label_names, &self.default_labels, true)?;
        let bounds = validate_buckets(name, buckets)?;
        match self.families.entry(name.to_string()) {
            Entry::Occupied(e) => match e.get() {
                Family::Histogram(h) if h.same_schema(&schema, &bounds) => Ok(Arc::clone(h)),
                _ => Err(PromError::Conflict(name.to_string())),
            },
            Entry::Vacant(e) => {
                let histogram = Arc::new(Histogram::new(schema, bounds));
                e.insert(Family::Histogram(Arc::clone(&histogram)));
                tracing::debug!(metric = %name, "histogram registered");
                Ok(histogram)
            }
        }
    }

    pub fn register_summary(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Arc<Summary>> {
        let schema = Schema::new(name, help, label_names, &self.default_labels, false)?;
        match self.families.entry(name.to_string()) {
            Entry::Occupied(e) => match e.get() {
                Family::Summary(s) if s.schema.same_labels(&schema) => Ok(Arc::clone(s)),
                _ => Err(PromError::Conflict(name.to_string())),
            },
            Entry::Vacant(e) => {
                let summary = Arc::new(Summary::new(schema));
                e.insert(Family::Summary(Arc::clone(&summary)));
                tracing::debug!(metric = %name, "summary registered");
                Ok(summary)
            }
        }
    }

    pub fn register_collector(&self, collector: Box<dyn Collector>) {
        self.collectors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(collector);
    }

    /// Sorted names of registered families (collectors excluded).
    pub fn family_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.families.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Drop every family and collector. Handles held elsewhere keep working
    /// but are no longer rendered.
    pub fn clear(&self) {
        self.families.clear();
        self.collectors
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Render all families in Prometheus text format, sorted by name.
    ///
    /// Each scalar is read atomically; a series updated while rendering may
    /// show a `_sum` that lags its counts, but histogram buckets are always
    /// cumulative and end at `_count`.
    pub fn render(&self) -> String {
        let mut families: Vec<(String, Family)> = self
            .families
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();

        let mut samples: Vec<Sample> = self
            .collectors
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .flat_map(|c| c.collect())
            .filter(|s| !self.families.contains_key(s.name))
            .collect();

        families.sort_by(|a, b| a.0.cmp(&b.0));
        samples.sort_by(|a, b| a.name.cmp(b.name));

        let mut out = String::new();
        let mut samples = samples.into_iter().peekable();
        for (name, family) in families {
            while let Some(s) = samples.next_if(|s| s.name < name.as_str()) {
                self.render_sample(&s, &mut out);
            }
            family.render(&self.default_labels, &mut out);
        }
        for s in samples {
            self.render_sample(&s, &mut out);
        }
        out
    }

    fn render_sample(&self, s: &Sample, out: &mut String) {
        write_header(out, s.name, s.help, s.kind.as_str());
        let labels = SeriesLabels {
            defaults: &self.default_labels,
            names: &[],
            values: &[],
        };
        write_sample(out, s.name, "", &labels, None, s.value);
    }
}
