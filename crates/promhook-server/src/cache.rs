//! Memoized-method cache statistics.
//!
//! The poller reads cumulative per-method stats through [`CacheStatsSource`].
//! [`MethodCache`] is a small in-memory memoizer implementing it, used by the
//! demo server and the tests; any other cache can plug in by implementing
//! the trait.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use promhook_core::cache::MethodCacheStats;
use promhook_core::error::{PromError, Result};

/// Cumulative cache statistics, one entry per method that has a cache.
#[async_trait]
pub trait CacheStatsSource: Send + Sync {
    /// `false` when the host runs without a cache; the poller then never starts.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn method_stats(&self) -> Vec<(String, MethodCacheStats)>;
}

#[derive(Debug, Default)]
struct MethodCounters {
    hits: AtomicU64,
    gets: AtomicU64,
    sets: AtomicU64,
    generates: AtomicU64,
    errors: AtomicU64,
    misses: AtomicU64,
    stales: AtomicU64,
}

impl MethodCounters {
    fn snapshot(&self) -> MethodCacheStats {
        let load = |v: &AtomicU64| v.load(Ordering::Relaxed) as f64;
        MethodCacheStats {
            hits: load(&self.hits),
            gets: load(&self.gets),
            sets: load(&self.sets),
            generates: load(&self.generates),
            errors: load(&self.errors),
            misses: load(&self.misses),
            stales: load(&self.stales),
        }
    }
}

/// Registry of memoized methods (server-wide cache).
#[derive(Debug)]
pub struct MethodCache {
    enabled: bool,
    methods: DashMap<String, Arc<MethodCounters>>,
}

impl Default for MethodCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodCache {
    pub fn new() -> Self {
        Self {
            enabled: true,
            methods: DashMap::new(),
        }
    }

    /// Cache turned off server-wide: methods still run, nothing is stored or counted.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            methods: DashMap::new(),
        }
    }

    /// Declare a memoized method. Names are unique.
    pub fn method<V>(&self, name: &str, ttl: Duration) -> Result<CachedMethod<V>>
    where
        V: Clone + Send + Sync,
    {
        let counters = Arc::new(MethodCounters::default());
        match self.methods.entry(name.to_string()) {
            Entry::Occupied(_) => Err(PromError::Config(format!(
                "cached method {name} already declared"
            ))),
            Entry::Vacant(e) => {
                e.insert(Arc::clone(&counters));
                Ok(CachedMethod {
                    name: name.to_string(),
                    ttl,
                    enabled: self.enabled,
                    entries: DashMap::new(),
                    counters,
                })
            }
        }
    }
}

#[async_trait]
impl CacheStatsSource for MethodCache {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn method_stats(&self) -> Vec<(String, MethodCacheStats)> {
        self.methods
            .iter()
            .map(|r| (r.key().clone(), r.value().snapshot()))
            .collect()
    }
}

#[derive(Debug)]
struct Stored<V> {
    value: V,
    stored: Instant,
}

/// One memoized method: values keyed by argument key, expiring after `ttl`.
#[derive(Debug)]
pub struct CachedMethod<V> {
    name: String,
    ttl: Duration,
    enabled: bool,
    entries: DashMap<String, Stored<V>>,
    counters: Arc<MethodCounters>,
}

impl<V> CachedMethod<V>
where
    V: Clone + Send + Sync,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the cached value for `key`, or run `generate` and store its result.
    pub fn call<E, F>(&self, key: &str, generate: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if !self.enabled {
            return generate();
        }

        let c = &self.counters;
        c.gets.fetch_add(1, Ordering::Relaxed);

        if let Some(e) = self.entries.get(key) {
            if e.stored.elapsed() < self.ttl {
                c.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(e.value.clone());
            }
            c.stales.fetch_add(1, Ordering::Relaxed);
        } else {
            c.misses.fetch_add(1, Ordering::Relaxed);
        }

        c.generates.fetch_add(1, Ordering::Relaxed);
        match generate() {
            Ok(value) => {
                self.entries.insert(
                    key.to_string(),
                    Stored {
                        value: value.clone(),
                        stored: Instant::now(),
                    },
                );
                c.sets.fetch_add(1, Ordering::Relaxed);
                Ok(value)
            }
            Err(e) => {
                c.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}
