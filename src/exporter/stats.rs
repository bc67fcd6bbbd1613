use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals for one exporter.
#[derive(Debug, Default)]
pub struct ExporterStats {
    cycles: AtomicU64,
    fetch_failures: AtomicU64,
    lines_forwarded: AtomicU64,
    forward_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub fetch_failures: u64,
    pub lines_forwarded: u64,
    pub forward_failures: u64,
}

impl ExporterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarding(&self, forwarded: u64, failed: u64) {
        self.lines_forwarded.fetch_add(forwarded, Ordering::Relaxed);
        self.forward_failures.fetch_add(failed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            lines_forwarded: self.lines_forwarded.load(Ordering::Relaxed),
            forward_failures: self.forward_failures.load(Ordering::Relaxed),
        }
    }
}
