//! Prometheus text exposition helpers (format version 0.0.4).

use std::fmt::Write;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a sample value the way scrapers expect (`+Inf`, `NaN`, `5` not `5.0`).
pub(crate) fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

pub(crate) fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, escape_help(help));
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

/// Label pairs of one series: registry defaults, then the instrument's own.
pub(crate) struct SeriesLabels<'a> {
    pub(crate) defaults: &'a [(String, String)],
    pub(crate) names: &'a [String],
    pub(crate) values: &'a [String],
}

impl SeriesLabels<'_> {
    /// Render `{a="x",b="y"}` with an optional trailing pair (`le` for buckets).
    /// Renders nothing when there are no labels at all.
    fn render(&self, extra: Option<(&str, &str)>) -> String {
        let pairs = self
            .defaults
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(
                self.names
                    .iter()
                    .zip(self.values.iter())
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            )
            .chain(extra)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>();

        if pairs.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", pairs.join(","))
        }
    }
}

pub(crate) fn write_sample(
    out: &mut String,
    name: &str,
    suffix: &str,
    labels: &SeriesLabels<'_>,
    extra: Option<(&str, &str)>,
    value: f64,
) {
    let _ = writeln!(
        out,
        "{}{}{} {}",
        name,
        suffix,
        labels.render(extra),
        fmt_value(value)
    );
}
