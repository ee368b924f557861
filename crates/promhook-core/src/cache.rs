//! Cumulative cache statistics and their conversion into counter deltas.
//!
//! The cache subsystem reports ever-growing totals per memoized method. The
//! poller turns successive readings into increments with [`CacheDeltas`]:
//! the first reading only seeds the baseline, later readings add
//! `current - last` when that is a valid non-negative number, and the
//! baseline always moves to the latest reading so one bad sample (a cache
//! restart, a NaN) never desynchronizes it.

use std::collections::HashMap;

use crate::metrics::Counter;

/// Stat kinds reported per method, in exposition label form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatType {
    Hits,
    Gets,
    Sets,
    Generates,
    Errors,
    Misses,
    Stales,
}

impl StatType {
    pub const ALL: [StatType; 7] = [
        StatType::Hits,
        StatType::Gets,
        StatType::Sets,
        StatType::Generates,
        StatType::Errors,
        StatType::Misses,
        StatType::Stales,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatType::Hits => "hits",
            StatType::Gets => "gets",
            StatType::Sets => "sets",
            StatType::Generates => "generates",
            StatType::Errors => "errors",
            StatType::Misses => "misses",
            StatType::Stales => "stales",
        }
    }
}

/// Cumulative counters of one memoized method at poll time.
///
/// `NaN` marks a stat the source does not track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MethodCacheStats {
    pub hits: f64,
    pub gets: f64,
    pub sets: f64,
    pub generates: f64,
    pub errors: f64,
    pub misses: f64,
    pub stales: f64,
}

impl MethodCacheStats {
    pub fn get(&self, stat: StatType) -> f64 {
        match stat {
            StatType::Hits => self.hits,
            StatType::Gets => self.gets,
            StatType::Sets => self.sets,
            StatType::Generates => self.generates,
            StatType::Errors => self.errors,
            StatType::Misses => self.misses,
            StatType::Stales => self.stales,
        }
    }
}

fn valid(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// LastSeen table: previous cumulative reading per `(method, stat)`.
#[derive(Debug, Default)]
pub struct CacheDeltas {
    last_seen: HashMap<(String, StatType), f64>,
}

impl CacheDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one method's reading into `counter` (labels `[method, type]`).
    /// Returns how many series were incremented by a positive delta.
    pub fn apply(&mut self, method: &str, stats: &MethodCacheStats, counter: &Counter) -> usize {
        let mut applied = 0;
        for stat in StatType::ALL {
            let current = stats.get(stat);
            let labels = [method, stat.as_str()];

            match self.last_seen.insert((method.to_string(), stat), current) {
                None => {
                    // first sighting: expose the series, count nothing yet
                    if valid(current) {
                        counter.inc(&labels, 0.0);
                    }
                }
                Some(last) => {
                    let delta = current - last;
                    if valid(delta) {
                        counter.inc(&labels, delta);
                        if delta > 0.0 {
                            applied += 1;
                        }
                    } else {
                        tracing::debug!(
                            method,
                            stat = stat.as_str(),
                            current,
                            last,
                            "cache delta dropped"
                        );
                    }
                }
            }
        }
        applied
    }

    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}
