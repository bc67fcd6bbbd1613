#![allow(dead_code)]

use router_log_exporter::LogSnapshot;
use router_log_exporter::device::{DeviceClient, FetchError};
use router_log_exporter::domain::ForwardRecord;
use router_log_exporter::sink::{ForwardError, MetricsSink};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Device that replays a script of snapshots; `None` simulates an unreachable device.
pub struct ScriptedDevice {
    script: Mutex<VecDeque<Option<Vec<String>>>>,
    fetches: AtomicUsize,
    /// Cancelled once the script has been exhausted
    cancel_when_done: Option<CancellationToken>,
}

impl ScriptedDevice {
    pub fn new(script: Vec<Option<Vec<&str>>>) -> Self {
        let script = script
            .into_iter()
            .map(|entry| entry.map(|lines| lines.into_iter().map(String::from).collect()))
            .collect();
        Self {
            script: Mutex::new(script),
            fetches: AtomicUsize::new(0),
            cancel_when_done: None,
        }
    }

    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_when_done = Some(token);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DeviceClient for ScriptedDevice {
    async fn fetch_snapshot(&self) -> Result<LogSnapshot, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let (next, exhausted) = {
            let mut script = self.script.lock().unwrap();
            let next = script.pop_front().flatten();
            (next, script.is_empty())
        };

        if exhausted {
            if let Some(token) = &self.cancel_when_done {
                token.cancel();
            }
        }

        next.map(LogSnapshot::new)
            .ok_or(FetchError::MalformedResponse("device unreachable".to_string()))
    }

    fn address(&self) -> &str {
        "192.168.178.1"
    }
}

/// Sink that records every attempted line and fails for a chosen set.
#[derive(Default)]
pub struct RecordingSink {
    attempts: Mutex<Vec<String>>,
    failing: Vec<String>,
}

impl RecordingSink {
    pub fn failing_on(lines: &[&str]) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failing: lines.iter().map(|line| (*line).to_string()).collect(),
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    async fn forward(&self, record: &ForwardRecord<'_>) -> Result<(), ForwardError> {
        self.attempts.lock().unwrap().push(record.line.to_string());
        if self.failing.iter().any(|line| line == record.line) {
            Err(ForwardError::Rejected { status: 503 })
        } else {
            Ok(())
        }
    }
}

/// Sink that takes `delay` per call and then times out, like a blackholed endpoint.
pub struct SlowSink {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetricsSink for SlowSink {
    async fn forward(&self, _record: &ForwardRecord<'_>) -> Result<(), ForwardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Err(ForwardError::Timeout(self.delay))
    }
}

pub fn snapshot(lines: &[&str]) -> LogSnapshot {
    lines.iter().copied().collect()
}
