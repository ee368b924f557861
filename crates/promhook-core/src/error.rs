//! Shared error type across promhook crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromError>;

/// Setup-time errors. Nothing on the update or render path returns one.
#[derive(Debug, Error)]
pub enum PromError {
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("invalid label name {label:?} on {metric}")]
    InvalidLabel { metric: String, label: String },
    #[error("invalid buckets for {metric}: {reason}")]
    InvalidBuckets { metric: String, reason: &'static str },
    #[error("metric {0} already registered with a different schema")]
    Conflict(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PromError {
    /// True for errors caused by the metric schema itself (name, labels, buckets).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            PromError::InvalidName(_)
                | PromError::InvalidLabel { .. }
                | PromError::InvalidBuckets { .. }
                | PromError::Conflict(_)
        )
    }
}
