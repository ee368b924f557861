#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use promhook_core::{MetricRegistry, PromError};

#[test]
fn registration_is_idempotent_per_name() {
    let reg = MetricRegistry::new();
    let a = reg.register_counter("jobs_total", "jobs", &["kind"]).unwrap();
    let b = reg.register_counter("jobs_total", "jobs again", &["kind"]).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    a.inc_one(&["x"]);
    assert_eq!(b.get(&["x"]), 1.0);
}

#[test]
fn conflicting_schema_is_rejected() {
    let reg = MetricRegistry::new();
    reg.register_counter("jobs_total", "jobs", &["kind"]).unwrap();

    let err = reg.register_counter("jobs_total", "jobs", &["kind", "queue"]).unwrap_err();
    assert!(matches!(err, PromError::Conflict(ref n) if n == "jobs_total"));
    assert!(err.is_schema_error());

    let err = reg.register_summary("jobs_total", "jobs", &["kind"]).unwrap_err();
    assert!(matches!(err, PromError::Conflict(_)));

    reg.register_histogram("lat", "latency", &[], &[0.1, 1.0]).unwrap();
    let err = reg.register_histogram("lat", "latency", &[], &[0.1, 2.0]).unwrap_err();
    assert!(matches!(err, PromError::Conflict(_)));
}

#[test]
fn invalid_names_and_labels() {
    let reg = MetricRegistry::new();
    assert!(matches!(
        reg.register_counter("1bad", "", &[]),
        Err(PromError::InvalidName(_))
    ));
    assert!(matches!(
        reg.register_counter("ok_total", "", &["__reserved"]),
        Err(PromError::InvalidLabel { .. })
    ));
    assert!(matches!(
        reg.register_counter("ok_total", "", &["a", "a"]),
        Err(PromError::InvalidLabel { .. })
    ));
    assert!(matches!(
        reg.register_histogram("h", "", &["le"], &[1.0]),
        Err(PromError::InvalidLabel { .. })
    ));
    // nothing half-registered
    assert!(reg.family_names().is_empty());
}

#[test]
fn invalid_buckets() {
    let reg = MetricRegistry::new();
    let cases: [&[f64]; 5] = [&[], &[1.0, 1.0], &[2.0, 1.0], &[f64::NAN], &[f64::INFINITY]];
    for buckets in cases {
        let err = reg.register_histogram("h", "", &[], buckets).unwrap_err();
        assert!(matches!(err, PromError::InvalidBuckets { .. }), "{buckets:?}");
    }

    // trailing +Inf is implicit and accepted
    let h = reg.register_histogram("h", "", &[], &[0.5, f64::INFINITY]).unwrap();
    assert_eq!(h.bounds(), &[0.5]);
}

#[test]
fn default_labels_must_not_clash() {
    let reg = MetricRegistry::with_default_labels([("app", "demo")]).unwrap();
    assert!(matches!(
        reg.register_counter("c", "", &["app"]),
        Err(PromError::InvalidLabel { .. })
    ));

    assert!(MetricRegistry::with_default_labels([("bad-name", "x")]).is_err());
    assert!(MetricRegistry::with_default_labels([("a", "x"), ("a", "y")]).is_err());
}

#[test]
fn clear_drops_everything() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c_total", "c", &[]).unwrap();
    c.inc_one(&[]);
    assert!(!reg.render().is_empty());

    reg.clear();
    assert!(reg.family_names().is_empty());
    assert_eq!(reg.render(), "");

    // a fresh registration after clear starts from zero
    let c2 = reg.register_counter("c_total", "c", &[]).unwrap();
    assert!(!Arc::ptr_eq(&c, &c2));
    assert_eq!(c2.get(&[]), 0.0);
}
