//! Plugin state shared by the middleware, the metrics route and the host.
//!
//! One `PromPlugin` owns one registry; clones share it. Nothing here is a
//! process-wide global, so several hosts in one process stay independent.

use std::sync::Arc;

use promhook_core::error::Result;
use promhook_core::process::ProcessCollector;
use promhook_core::{
    Counter, DurationTracker, Histogram, MetricRegistry, RequestId, Summary, SummaryTimer,
};

use crate::cache::CacheStatsSource;
use crate::config::{HttpLabel, PluginConfig};
use crate::ops::{BearerToken, MetricsAuth};
use crate::poller::CachePoller;

/// Route label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

struct HttpInstruments {
    buckets: Arc<Histogram>,
    bucket_labels: Vec<HttpLabel>,
    duration: Arc<Summary>,
    duration_labels: Vec<HttpLabel>,
}

impl HttpInstruments {
    fn observe(&self, method: &str, route: &str, status: &str, seconds: f64) {
        let values = |labels: &[HttpLabel]| label_values(labels, method, route, status);
        self.buckets.observe(&values(&self.bucket_labels), seconds);
        self.duration.observe(&values(&self.duration_labels), seconds);
    }
}

fn label_values<'a>(
    labels: &[HttpLabel],
    method: &'a str,
    route: &'a str,
    status: &'a str,
) -> Vec<&'a str> {
    labels
        .iter()
        .map(|l| match l {
            HttpLabel::Method => method,
            HttpLabel::Path => route,
            HttpLabel::Status => status,
        })
        .collect()
}

struct PluginInner {
    cfg: PluginConfig,
    registry: MetricRegistry,
    tracker: DurationTracker,
    http: HttpInstruments,
    timer: Arc<Summary>,
    counter: Arc<Counter>,
    method_cache: Arc<Counter>,
    cache_source: Option<Arc<dyn CacheStatsSource>>,
    poller: CachePoller,
    auth: Option<Arc<dyn MetricsAuth>>,
}

#[derive(Clone)]
pub struct PromPlugin {
    inner: Arc<PluginInner>,
}

/// Builder for [`PromPlugin`].
pub struct PromPluginBuilder {
    cfg: PluginConfig,
    cache_source: Option<Arc<dyn CacheStatsSource>>,
    auth: Option<Arc<dyn MetricsAuth>>,
}

impl PromPluginBuilder {
    /// Cache whose per-method stats are polled (when `cache_poll_interval` is set).
    pub fn cache_source(mut self, source: Arc<dyn CacheStatsSource>) -> Self {
        self.cache_source = Some(source);
        self
    }

    /// Authorizer for the metrics route; overrides `auth.bearer_token`.
    pub fn auth(mut self, auth: Arc<dyn MetricsAuth>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Register every instrument. Schema problems (bad namespace, buckets,
    /// labels) fail here, before the host starts serving.
    pub fn build(self) -> Result<PromPlugin> {
        let cfg = self.cfg;
        cfg.validate()?;

        let registry = MetricRegistry::with_default_labels(cfg.default_labels())?;
        if cfg.default_metrics {
            registry.register_collector(Box::new(ProcessCollector::new()));
        }

        let names = |labels: &[HttpLabel]| labels.iter().map(|l| l.as_str()).collect::<Vec<_>>();
        let http = HttpInstruments {
            buckets: registry.register_histogram(
                &cfg.metric_name("request_duration_seconds"),
                "request duration in seconds, bucketed",
                &names(&cfg.labels.buckets),
                &cfg.buckets,
            )?,
            bucket_labels: cfg.labels.buckets.clone(),
            duration: registry.register_summary(
                &cfg.metric_name("request_duration_summary_seconds"),
                "request duration in seconds",
                &names(&cfg.labels.duration),
            )?,
            duration_labels: cfg.labels.duration.clone(),
        };
        let timer = registry.register_summary(
            &cfg.metric_name("timer"),
            "application timers in seconds",
            &["name"],
        )?;
        let counter = registry.register_counter(
            &cfg.metric_name("counter"),
            "application counters",
            &["name"],
        )?;
        let method_cache = registry.register_counter(
            &cfg.metric_name("method_cache"),
            "memoized method cache activity",
            &["method", "type"],
        )?;

        let auth = self.auth.or_else(|| {
            cfg.auth
                .bearer_token
                .clone()
                .map(|t| Arc::new(BearerToken::new(t)) as Arc<dyn MetricsAuth>)
        });

        Ok(PromPlugin {
            inner: Arc::new(PluginInner {
                cfg,
                registry,
                tracker: DurationTracker::new(),
                http,
                timer,
                counter,
                method_cache,
                cache_source: self.cache_source,
                poller: CachePoller::new(),
                auth,
            }),
        })
    }
}

impl PromPlugin {
    pub fn builder(cfg: PluginConfig) -> PromPluginBuilder {
        PromPluginBuilder {
            cfg,
            cache_source: None,
            auth: None,
        }
    }

    /// Plugin without cache polling or custom auth.
    pub fn new(cfg: PluginConfig) -> Result<Self> {
        Self::builder(cfg).build()
    }

    pub fn cfg(&self) -> &PluginConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.inner.registry
    }

    pub fn tracker(&self) -> &DurationTracker {
        &self.inner.tracker
    }

    pub fn auth(&self) -> Option<&dyn MetricsAuth> {
        self.inner.auth.as_deref()
    }

    pub fn is_metrics_path(&self, path: &str) -> bool {
        path == self.inner.cfg.metrics_path
    }

    /// Pre-handler hook. Hosts skip it for the metrics route.
    pub fn on_request_start(&self, id: RequestId) {
        self.inner.tracker.begin(id);
    }

    /// Post-response hook, called once per request. A request that was never
    /// started (the metrics route) records nothing.
    pub fn on_request_response(&self, id: RequestId, method: &str, route: &str, status: u16) {
        let Some(elapsed) = self.inner.tracker.end(id) else {
            tracing::debug!(%id, "no start record, request not measured");
            return;
        };
        self.inner
            .http
            .observe(method, route, &status.to_string(), elapsed.as_secs_f64());
    }

    /// Exposition text of every series.
    pub fn render(&self) -> String {
        self.inner.registry.render()
    }

    /// Ad-hoc timer recorded under `<ns>_timer{name}` once stopped.
    pub fn start_timer(&self, name: &str) -> SummaryTimer {
        self.inner.timer.start_timer(&[name])
    }

    /// Ad-hoc counter `<ns>_counter{name}`.
    pub fn inc_counter(&self, name: &str) {
        self.inner.counter.inc_one(&[name]);
    }

    /// Start cache polling if configured; call once the host is serving.
    /// Does nothing without a cache source, when polling is disabled, or
    /// after `shutdown`.
    pub fn start_cache_polling(&self) -> bool {
        let Some(source) = self.inner.cache_source.clone() else {
            return false;
        };
        self.inner.poller.start(
            self.inner.cfg.cache_poll_interval(),
            Arc::clone(&self.inner.method_cache),
            source,
        )
    }

    pub fn is_polling(&self) -> bool {
        self.inner.poller.is_running()
    }

    /// Host stop: cancel the poller and drop all instrument state. Idempotent.
    pub fn shutdown(&self) {
        self.inner.poller.stop();
        self.inner.registry.clear();
        tracing::info!("metrics plugin shut down");
    }
}
