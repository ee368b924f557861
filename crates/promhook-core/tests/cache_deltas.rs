#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use promhook_core::cache::{CacheDeltas, MethodCacheStats, StatType};
use promhook_core::MetricRegistry;

fn hits(v: f64) -> MethodCacheStats {
    MethodCacheStats { hits: v, ..Default::default() }
}

#[test]
fn first_reading_only_seeds() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("method_cache", "cache", &["method", "type"]).unwrap();
    let mut deltas = CacheDeltas::new();

    // activity before the poller started must not be counted
    deltas.apply("sum", &hits(40.0), &c);
    assert_eq!(c.get(&["sum", "hits"]), 0.0);
    // series are exposed at zero
    assert_eq!(c.series_count(), StatType::ALL.len());
    assert_eq!(deltas.tracked(), StatType::ALL.len());
}

#[test]
fn deltas_not_cumulative_reapply() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("method_cache", "cache", &["method", "type"]).unwrap();
    let mut deltas = CacheDeltas::new();

    assert_eq!(deltas.apply("sum", &hits(0.0), &c), 0);
    assert_eq!(deltas.apply("sum", &hits(0.0), &c), 0);
    assert_eq!(c.get(&["sum", "hits"]), 0.0);
    assert_eq!(deltas.apply("sum", &hits(5.0), &c), 1);
    assert_eq!(c.get(&["sum", "hits"]), 5.0);
    deltas.apply("sum", &hits(5.0), &c);
    assert_eq!(c.get(&["sum", "hits"]), 5.0);
}

#[test]
fn source_reset_is_dropped_and_rebaselined() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("method_cache", "cache", &["method", "type"]).unwrap();
    let mut deltas = CacheDeltas::new();

    deltas.apply("sum", &hits(10.0), &c);
    deltas.apply("sum", &hits(12.0), &c);
    assert_eq!(c.get(&["sum", "hits"]), 2.0);

    // cache restarted: negative delta dropped, baseline moves to 1
    deltas.apply("sum", &hits(1.0), &c);
    assert_eq!(c.get(&["sum", "hits"]), 2.0);

    deltas.apply("sum", &hits(4.0), &c);
    assert_eq!(c.get(&["sum", "hits"]), 5.0);
}

#[test]
fn untracked_stats_never_materialize() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("method_cache", "cache", &["method", "type"]).unwrap();
    let mut deltas = CacheDeltas::new();

    let stats = |gets: f64| MethodCacheStats {
        gets,
        misses: f64::NAN,
        ..Default::default()
    };
    deltas.apply("sum", &stats(1.0), &c);
    deltas.apply("sum", &stats(3.0), &c);

    assert_eq!(c.get(&["sum", "gets"]), 2.0);
    let body = reg.render();
    assert!(!body.contains("type=\"misses\""));
    assert!(!body.contains("NaN"));
    assert!(body.contains("method_cache{method=\"sum\",type=\"stales\"} 0"));
}

#[test]
fn nan_in_the_middle_does_not_desync() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("method_cache", "cache", &["method", "type"]).unwrap();
    let mut deltas = CacheDeltas::new();

    deltas.apply("m", &hits(1.0), &c);
    deltas.apply("m", &hits(f64::NAN), &c);
    deltas.apply("m", &hits(3.0), &c); // 3 - NaN: dropped, baseline 3
    deltas.apply("m", &hits(4.0), &c);
    assert_eq!(c.get(&["m", "hits"]), 1.0);
}
