//! Cache statistics poller.
//!
//! Idle -> `start` -> Running -> `stop` -> Stopped (terminal).
//!
//! Every tick reads the source, then folds the readings into the
//! `method_cache` counter while holding the tick gate. `stop` closes the gate
//! before aborting the task, so once it returns no tick can touch the
//! registry anymore, even one that was mid-read.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use promhook_core::cache::{CacheDeltas, MethodCacheStats};
use promhook_core::Counter;

use crate::cache::CacheStatsSource;

enum State {
    Idle,
    Running {
        gate: Arc<Mutex<bool>>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

pub struct CachePoller {
    state: Mutex<State>,
}

impl Default for CachePoller {
    fn default() -> Self {
        Self::new()
    }
}

impl CachePoller {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Idle),
        }
    }

    /// Start polling `source` every `interval`. Returns whether a task was started.
    ///
    /// Not starting is never an error: the interval may be missing or zero,
    /// the source's cache may be disabled, there may be no tokio runtime, or
    /// the poller already ran.
    pub fn start(
        &self,
        interval: Option<Duration>,
        counter: Arc<Counter>,
        source: Arc<dyn CacheStatsSource>,
    ) -> bool {
        let Some(interval) = interval.filter(|i| !i.is_zero()) else {
            tracing::info!("cache polling disabled by config");
            return false;
        };
        if !source.is_enabled() {
            tracing::info!("server cache disabled, cache polling not started");
            return false;
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !matches!(*state, State::Idle) {
            tracing::debug!("cache poller already started or stopped");
            return false;
        }
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no tokio runtime, cache polling not started");
            return false;
        };

        let gate = Arc::new(Mutex::new(true));
        let handle = rt.spawn(run(interval, counter, source, Arc::clone(&gate)));
        *state = State::Running { gate, handle };
        tracing::info!(interval_ms = interval.as_millis() as u64, "cache polling started");
        true
    }

    pub fn is_running(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(|e| e.into_inner()),
            State::Running { .. }
        )
    }

    /// Cancel polling for good. Idempotent; after it returns no further
    /// ticks apply updates.
    pub fn stop(&self) {
        let prev = std::mem::replace(
            &mut *self.state.lock().unwrap_or_else(|e| e.into_inner()),
            State::Stopped,
        );
        let State::Running { gate, handle } = prev else {
            return;
        };

        // blocks until a tick that is applying updates has finished
        *gate.lock().unwrap_or_else(|e| e.into_inner()) = false;
        handle.abort();
        tracing::info!("cache polling stopped");
    }
}

impl Drop for CachePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    interval: Duration,
    counter: Arc<Counter>,
    source: Arc<dyn CacheStatsSource>,
    gate: Arc<Mutex<bool>>,
) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // LastSeen lives for this run only.
    let mut deltas = CacheDeltas::new();

    loop {
        tick.tick().await;
        let readings = source.method_stats().await;
        if !apply_tick(&gate, &mut deltas, &readings, &counter) {
            break;
        }
    }
}

/// Fold one reading under the gate. Returns `false` once the poller is stopped.
fn apply_tick(
    gate: &Mutex<bool>,
    deltas: &mut CacheDeltas,
    readings: &[(String, MethodCacheStats)],
    counter: &Counter,
) -> bool {
    let open = gate.lock().unwrap_or_else(|e| e.into_inner());
    if !*open {
        return false;
    }
    let applied: usize = readings
        .iter()
        .map(|(method, stats)| deltas.apply(method, stats, counter))
        .sum();
    tracing::trace!(methods = readings.len(), applied, "cache stats polled");
    true
}
