#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promhook_core::metrics::{Collector, MetricKind, Sample};
use promhook_core::MetricRegistry;

#[test]
fn empty_registry_renders_empty_body() {
    assert_eq!(MetricRegistry::new().render(), "");
}

#[test]
fn counter_family_layout() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("app_counter", "ad-hoc counters", &["name"]).unwrap();
    c.inc_one(&["some here"]);
    c.inc_one(&["more over there"]);
    c.inc(&["some here"], 1.5);

    let expected = "\
# HELP app_counter ad-hoc counters
# TYPE app_counter counter
app_counter{name=\"more over there\"} 1
app_counter{name=\"some here\"} 2.5
";
    assert_eq!(reg.render(), expected);
}

#[test]
fn histogram_family_layout() {
    let reg = MetricRegistry::with_default_labels([("app", "demo")]).unwrap();
    let h = reg
        .register_histogram("req_seconds", "latency", &["method", "path"], &[0.1, 5.0])
        .unwrap();
    h.observe(&["GET", "/slow"], 0.0625);
    h.observe(&["GET", "/slow"], 2.0);
    h.observe(&["GET", "/slow"], 7.0);

    let expected = "\
# HELP req_seconds latency
# TYPE req_seconds histogram
req_seconds_bucket{app=\"demo\",method=\"GET\",path=\"/slow\",le=\"0.1\"} 1
req_seconds_bucket{app=\"demo\",method=\"GET\",path=\"/slow\",le=\"5\"} 2
req_seconds_bucket{app=\"demo\",method=\"GET\",path=\"/slow\",le=\"+Inf\"} 3
req_seconds_sum{app=\"demo\",method=\"GET\",path=\"/slow\"} 9.0625
req_seconds_count{app=\"demo\",method=\"GET\",path=\"/slow\"} 3
";
    assert_eq!(reg.render(), expected);
}

#[test]
fn summary_family_layout_and_registered_but_empty_families() {
    let reg = MetricRegistry::new();
    let s = reg.register_summary("timer", "timers", &["name"]).unwrap();
    reg.register_counter("untouched_total", "never incremented", &["x"]).unwrap();
    s.observe(&["response time"], 0.25);
    s.observe(&["response time"], 0.5);

    let expected = "\
# HELP timer timers
# TYPE timer summary
timer_sum{name=\"response time\"} 0.75
timer_count{name=\"response time\"} 2
# HELP untouched_total never incremented
# TYPE untouched_total counter
";
    assert_eq!(reg.render(), expected);
}

#[test]
fn label_values_and_help_are_escaped() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c_total", "line one\nback\\slash", &["v"]).unwrap();
    c.inc_one(&["a\"b\\c\nd"]);

    let body = reg.render();
    assert!(body.contains("# HELP c_total line one\\nback\\\\slash\n"));
    assert!(body.contains("c_total{v=\"a\\\"b\\\\c\\nd\"} 1\n"));
}

#[test]
fn families_and_series_are_sorted() {
    let reg = MetricRegistry::new();
    let b = reg.register_counter("b_total", "b", &["k"]).unwrap();
    let a = reg.register_counter("a_total", "a", &[]).unwrap();
    b.inc_one(&["z"]);
    b.inc_one(&["m"]);
    a.inc_one(&[]);

    let body = reg.render();
    let a_pos = body.find("a_total 1").unwrap();
    let m_pos = body.find("b_total{k=\"m\"}").unwrap();
    let z_pos = body.find("b_total{k=\"z\"}").unwrap();
    assert!(a_pos < m_pos && m_pos < z_pos);

    // deterministic
    assert_eq!(body, reg.render());
}

struct Fixed;

impl Collector for Fixed {
    fn collect(&self) -> Vec<Sample> {
        vec![
            Sample { name: "zz_gauge", help: "last", kind: MetricKind::Gauge, value: 2.0 },
            Sample { name: "aa_gauge", help: "first", kind: MetricKind::Gauge, value: f64::INFINITY },
        ]
    }
}

#[test]
fn collectors_are_merged_in_name_order() {
    let reg = MetricRegistry::new();
    reg.register_collector(Box::new(Fixed));
    reg.register_counter("mm_total", "middle", &[]).unwrap().inc_one(&[]);

    let expected = "\
# HELP aa_gauge first
# TYPE aa_gauge gauge
aa_gauge +Inf
# HELP mm_total middle
# TYPE mm_total counter
mm_total 1
# HELP zz_gauge last
# TYPE zz_gauge gauge
zz_gauge 2
";
    assert_eq!(reg.render(), expected);
}
