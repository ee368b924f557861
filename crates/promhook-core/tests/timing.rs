#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use promhook_core::DurationTracker;

#[test]
fn end_without_begin_is_noop() {
    let t = DurationTracker::new();
    let id = t.next_id();
    assert!(t.end(id).is_none());
    assert_eq!(t.in_flight(), 0);
}

#[test]
fn end_consumes_the_start_record() {
    let t = DurationTracker::new();
    let id = t.next_id();
    t.begin(id);
    thread::sleep(Duration::from_millis(2));
    let elapsed = t.end(id).unwrap();
    assert!(elapsed >= Duration::from_millis(2));
    assert!(t.end(id).is_none());
}

#[test]
fn discard_forgets_without_measuring() {
    let t = DurationTracker::new();
    let id = t.next_id();
    t.begin(id);
    assert_eq!(t.in_flight(), 1);
    t.discard(id);
    assert_eq!(t.in_flight(), 0);
    assert!(t.end(id).is_none());
}

#[test]
fn concurrent_requests_do_not_interfere() {
    let t = DurationTracker::new();
    let ids: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let t = &t;
                s.spawn(move || {
                    let id = t.next_id();
                    t.begin(id);
                    thread::sleep(Duration::from_millis(i % 4));
                    assert!(t.end(id).is_some());
                    id
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(t.in_flight(), 0);
}
