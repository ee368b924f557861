use crate::error::{PromError, Result};

/// Ordered label values identifying one series of an instrument.
///
/// Values are positional: the n-th value belongs to the n-th declared label
/// name. Ordering derives from the values, which keeps rendering deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelSet(Box<[String]>);

impl LabelSet {
    pub fn new(values: &[&str]) -> Self {
        Self(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

/// Name, help text and declared label names shared by every instrument kind.
#[derive(Debug)]
pub(crate) struct Schema {
    pub(crate) name: String,
    pub(crate) help: String,
    pub(crate) label_names: Box<[String]>,
}

impl Schema {
    pub(crate) fn new(
        name: &str,
        help: &str,
        label_names: &[&str],
        reserved: &[(String, String)],
        forbid_le: bool,
    ) -> Result<Self> {
        if !valid_metric_name(name) {
            return Err(PromError::InvalidName(name.to_string()));
        }

        let mut names: Vec<String> = Vec::with_capacity(label_names.len());
        for &label in label_names {
            let clash = names.iter().any(|n| n == label)
                || reserved.iter().any(|(n, _)| n == label)
                || (forbid_le && label == "le");
            if clash || !valid_label_name(label) {
                return Err(PromError::InvalidLabel {
                    metric: name.to_string(),
                    label: label.to_string(),
                });
            }
            names.push(label.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            help: help.to_string(),
            label_names: names.into_boxed_slice(),
        })
    }

    pub(crate) fn same_labels(&self, other: &Schema) -> bool {
        self.label_names == other.label_names
    }

    /// Build the series key, or `None` when the caller passed the wrong arity.
    pub(crate) fn key(&self, values: &[&str]) -> Option<LabelSet> {
        if values.len() != self.label_names.len() {
            tracing::warn!(
                metric = %self.name,
                expected = self.label_names.len(),
                got = values.len(),
                "label value count mismatch, sample dropped"
            );
            return None;
        }
        Some(LabelSet::new(values))
    }
}

pub(crate) fn valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

pub(crate) fn valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
