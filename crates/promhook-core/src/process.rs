//! Process-level metrics (memory, CPU, file descriptors) read from `/proc`.
//!
//! Only Linux exposes these; elsewhere the collector yields nothing. CPU and
//! start time assume the common `CLK_TCK = 100`; memory comes from the kB
//! fields of `/proc/self/status`, so it holds for any page size.

use crate::metrics::{Collector, MetricKind, Sample};

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
const CLOCK_TICKS_PER_SEC: f64 = 100.0;

#[derive(Debug, Default)]
pub struct ProcessCollector;

impl ProcessCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Collector for ProcessCollector {
    fn collect(&self) -> Vec<Sample> {
        #[cfg(target_os = "linux")]
        {
            linux::collect()
        }
        #[cfg(not(target_os = "linux"))]
        {
            Vec::new()
        }
    }
}

/// Fields of `/proc/self/stat` after the `(comm)` field, 0-based from `state`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn stat_fields(stat: &str) -> Vec<&str> {
    match stat.rfind(')') {
        Some(i) => stat[i + 1..].split_whitespace().collect(),
        None => Vec::new(),
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_stat(stat: &str, boot_time: Option<f64>) -> Vec<Sample> {
    let fields = stat_fields(stat);
    let num = |i: usize| fields.get(i).and_then(|v| v.parse::<f64>().ok());

    let mut out = Vec::new();
    // utime = 11, stime = 12, starttime = 19
    if let (Some(utime), Some(stime)) = (num(11), num(12)) {
        out.push(Sample {
            name: "process_cpu_seconds_total",
            help: "Total user and system CPU time spent in seconds.",
            kind: MetricKind::Counter,
            value: (utime + stime) / CLOCK_TICKS_PER_SEC,
        });
    }
    if let (Some(start), Some(btime)) = (num(19), boot_time) {
        out.push(Sample {
            name: "process_start_time_seconds",
            help: "Start time of the process since unix epoch in seconds.",
            kind: MetricKind::Gauge,
            value: btime + start / CLOCK_TICKS_PER_SEC,
        });
    }
    out
}

/// `VmSize` and `VmRSS` from `/proc/self/status`, reported in kB.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_status(status: &str) -> Vec<Sample> {
    let kb = |key: &str| {
        status
            .lines()
            .find_map(|l| l.strip_prefix(key))
            .and_then(|v| v.trim().strip_suffix("kB"))
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map(|v| v * 1024.0)
    };

    let mut out = Vec::new();
    if let Some(vsize) = kb("VmSize:") {
        out.push(Sample {
            name: "process_virtual_memory_bytes",
            help: "Virtual memory size in bytes.",
            kind: MetricKind::Gauge,
            value: vsize,
        });
    }
    if let Some(rss) = kb("VmRSS:") {
        out.push(Sample {
            name: "process_resident_memory_bytes",
            help: "Resident memory size in bytes.",
            kind: MetricKind::Gauge,
            value: rss,
        });
    }
    out
}

#[cfg(target_os = "linux")]
mod linux {
    use std::fs;

    use super::{parse_stat, parse_status, MetricKind, Sample};

    fn boot_time() -> Option<f64> {
        let stat = fs::read_to_string("/proc/stat").ok()?;
        stat.lines()
            .find_map(|l| l.strip_prefix("btime "))
            .and_then(|v| v.trim().parse().ok())
    }

    pub(super) fn collect() -> Vec<Sample> {
        let mut out = match fs::read_to_string("/proc/self/stat") {
            Ok(stat) => parse_stat(&stat, boot_time()),
            Err(e) => {
                tracing::debug!(error = %e, "process stats unavailable");
                Vec::new()
            }
        };
        match fs::read_to_string("/proc/self/status") {
            Ok(status) => out.extend(parse_status(&status)),
            Err(e) => tracing::debug!(error = %e, "process status unavailable"),
        }
        if let Ok(fds) = fs::read_dir("/proc/self/fd") {
            // the listing holds one descriptor of its own
            let open = fds.count().saturating_sub(1);
            out.push(Sample {
                name: "process_open_fds",
                help: "Number of open file descriptors.",
                kind: MetricKind::Gauge,
                value: open as f64,
            });
        }
        out
    }
}
