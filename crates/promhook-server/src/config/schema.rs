use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use promhook_core::error::{PromError, Result};
use serde::Deserialize;

/// Either a value or a boolean flag; `false` disables the option.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    Value(T),
    Flag(bool),
}

impl<T> Toggle<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Toggle::Value(v) => Some(v),
            Toggle::Flag(_) => None,
        }
    }

    fn is_true(&self) -> bool {
        matches!(self, Toggle::Flag(true))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginConfig {
    pub version: u32,

    /// Demo binary listen address.
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Prefix of every metric name the plugin registers.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Expose process memory/CPU/fd metrics.
    #[serde(default = "default_true")]
    pub default_metrics: bool,

    /// Static labels added to every series, or `false`.
    #[serde(default)]
    pub default_labels: Option<Toggle<BTreeMap<String, String>>>,

    #[serde(default)]
    pub labels: LabelsSection,

    #[serde(default = "default_buckets")]
    pub buckets: Vec<f64>,

    /// Milliseconds between cache polls, or `false`/`0` to disable.
    #[serde(default)]
    pub cache_poll_interval: Option<Toggle<u64>>,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            version: 1,
            listen: default_listen(),
            metrics_path: default_metrics_path(),
            namespace: default_namespace(),
            default_metrics: true,
            default_labels: None,
            labels: LabelsSection::default(),
            buckets: default_buckets(),
            cache_poll_interval: None,
            auth: AuthConfig::default(),
        }
    }
}

impl PluginConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PromError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(PromError::Config("listen must be a valid SocketAddr".into()));
        }
        if !self.metrics_path.starts_with('/') {
            return Err(PromError::Config("metrics_path must start with '/'".into()));
        }
        if self.namespace.is_empty() {
            return Err(PromError::Config("namespace must not be empty".into()));
        }
        if self.default_labels.as_ref().is_some_and(Toggle::is_true) {
            return Err(PromError::Config(
                "default_labels must be a mapping or false".into(),
            ));
        }
        if self.cache_poll_interval.as_ref().is_some_and(Toggle::is_true) {
            return Err(PromError::Config(
                "cache_poll_interval must be milliseconds or false".into(),
            ));
        }
        if self.auth.bearer_token.as_deref().is_some_and(str::is_empty) {
            return Err(PromError::Config("auth.bearer_token must not be empty".into()));
        }
        Ok(())
    }

    /// Poll interval, `None` when polling is disabled.
    pub fn cache_poll_interval(&self) -> Option<Duration> {
        self.cache_poll_interval
            .as_ref()
            .and_then(Toggle::value)
            .filter(|ms| **ms > 0)
            .map(|ms| Duration::from_millis(*ms))
    }

    pub fn default_labels(&self) -> Vec<(String, String)> {
        self.default_labels
            .as_ref()
            .and_then(Toggle::value)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Full metric name under the configured namespace.
    pub fn metric_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.namespace, suffix)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_namespace() -> String {
    "promhook".into()
}
fn default_true() -> bool {
    true
}
fn default_buckets() -> Vec<f64> {
    vec![0.1, 0.3, 1.2, 5.0]
}

/// Request attributes that can label the HTTP latency series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpLabel {
    Method,
    Path,
    Status,
}

impl HttpLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpLabel::Method => "method",
            HttpLabel::Path => "path",
            HttpLabel::Status => "status",
        }
    }
}

/// Which labels the histogram (`buckets`) and summary (`duration`) carry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelsSection {
    #[serde(default = "default_http_labels")]
    pub buckets: Vec<HttpLabel>,
    #[serde(default = "default_http_labels")]
    pub duration: Vec<HttpLabel>,
}

impl Default for LabelsSection {
    fn default() -> Self {
        Self {
            buckets: default_http_labels(),
            duration: default_http_labels(),
        }
    }
}

fn default_http_labels() -> Vec<HttpLabel> {
    vec![HttpLabel::Method, HttpLabel::Path, HttpLabel::Status]
}

/// Metrics route protection. No auth unless a token is set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default)]
    pub bearer_token: Option<String>,
}
