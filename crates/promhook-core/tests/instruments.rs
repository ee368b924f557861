#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::thread;

use promhook_core::MetricRegistry;

const THREADS: usize = 8;
const PER_THREAD: usize = 2_400;

#[test]
fn concurrent_counter_updates_are_not_lost() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("hits_total", "hits", &["route"]).unwrap();

    thread::scope(|s| {
        for t in 0..THREADS {
            let c = &c;
            s.spawn(move || {
                let route = if t % 2 == 0 { "/a" } else { "/b" };
                for i in 0..PER_THREAD {
                    c.inc(&[route], 0.5);
                    // adversarial input in between valid deltas
                    if i % 100 == 0 {
                        c.inc(&[route], -10.0);
                        c.inc(&[route], f64::NAN);
                    }
                }
            });
        }
    });

    let per_route = (THREADS / 2 * PER_THREAD) as f64 * 0.5;
    assert_eq!(c.get(&["/a"]), per_route);
    assert_eq!(c.get(&["/b"]), per_route);
}

#[test]
fn counter_never_decreases() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c_total", "c", &[]).unwrap();
    let mut last = c.get(&[]);
    for delta in [1.0, -1.0, 0.0, f64::NAN, f64::NEG_INFINITY, f64::INFINITY, 2.5, -0.5] {
        c.inc(&[], delta);
        let now = c.get(&[]);
        assert!(now >= last, "{delta} moved counter from {last} to {now}");
        last = now;
    }
    assert_eq!(last, 3.5);
}

#[test]
fn unseen_labels_read_zero_and_wrong_arity_is_ignored() {
    let reg = MetricRegistry::new();
    let c = reg.register_counter("c_total", "c", &["method", "type"]).unwrap();
    assert_eq!(c.get(&["sum", "hits"]), 0.0);

    c.inc(&["only-one"], 1.0);
    c.inc(&["a", "b", "c"], 1.0);
    assert_eq!(c.series_count(), 0);
}

#[test]
fn concurrent_histogram_observations() {
    let reg = MetricRegistry::new();
    let h = reg
        .register_histogram("lat_seconds", "latency", &["route"], &[0.1, 0.3, 1.2, 5.0])
        .unwrap();
    let values = [0.05, 0.1, 0.2, 1.0, 3.0, 10.0];

    thread::scope(|s| {
        for _ in 0..THREADS {
            let h = &h;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    h.observe(&["/x"], values[i % values.len()]);
                }
            });
        }
    });

    let snap = h.snapshot(&["/x"]).unwrap();
    let total = (THREADS * PER_THREAD) as u64;
    assert_eq!(snap.count, total);
    assert_eq!(snap.buckets.last().unwrap(), &(f64::INFINITY, total));
    for w in snap.buckets.windows(2) {
        assert!(w[0].1 <= w[1].1);
    }

    // value == bound lands in that bucket
    let per_value = total / values.len() as u64;
    assert_eq!(snap.buckets[0], (0.1, 2 * per_value));
    assert_eq!(snap.buckets[1], (0.3, 3 * per_value));
    assert_eq!(snap.buckets[2], (1.2, 4 * per_value));
    assert_eq!(snap.buckets[3], (5.0, 5 * per_value));
}

#[test]
fn histogram_drops_nan() {
    let reg = MetricRegistry::new();
    let h = reg.register_histogram("h", "h", &[], &[1.0]).unwrap();
    h.observe(&[], f64::NAN);
    assert!(h.snapshot(&[]).is_none());

    h.observe(&[], f64::INFINITY);
    let snap = h.snapshot(&[]).unwrap();
    assert_eq!(snap.buckets, vec![(1.0, 0), (f64::INFINITY, 1)]);
}

#[test]
fn summary_timer_records_on_stop_only() {
    let reg = MetricRegistry::new();
    let s = reg.register_summary("timer", "t", &["name"]).unwrap();

    let dropped = s.start_timer(&["abandoned"]);
    drop(dropped);
    assert!(s.get(&["abandoned"]).is_none());

    let t = s.start_timer(&["work"]);
    thread::sleep(std::time::Duration::from_millis(5));
    let elapsed = t.stop();
    let (sum, count) = s.get(&["work"]).unwrap();
    assert_eq!(count, 1);
    assert_eq!(sum, elapsed);
    assert!(elapsed >= 0.005);
}
