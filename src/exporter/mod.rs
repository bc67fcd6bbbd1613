//! The poll loop: fetch a snapshot, forward what is new, keep the snapshot.

pub mod stats;

pub use stats::{ExporterStats, StatsSnapshot};

use crate::device::DeviceClient;
use crate::domain::{CaseSensitivity, ForwardRecord, LogDelta, LogSnapshot};
use crate::sink::MetricsSink;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ExporterSettings {
    pub poll_interval: Duration,
    pub case: CaseSensitivity,
    /// Host name stamped on every forwarded record
    pub host: String,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            case: CaseSensitivity::default(),
            host: Self::detect_host(),
        }
    }
}

impl ExporterSettings {
    pub fn detect_host() -> String {
        hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The device could not be read; the baseline was left alone.
    FetchFailed,
    Completed {
        fetched: usize,
        new_lines: usize,
        forwarded: usize,
        failed: usize,
    },
    /// Shutdown arrived while forwarding; the rest of the delta was skipped
    /// but the baseline still rotated.
    Interrupted {
        fetched: usize,
        new_lines: usize,
        forwarded: usize,
        failed: usize,
    },
}

/// Owns the device client, the sink and the previous snapshot.
pub struct Exporter<D, S> {
    device: D,
    sink: S,
    settings: ExporterSettings,
    baseline: LogSnapshot,
    stats: ExporterStats,
}

impl<D, S> Exporter<D, S>
where
    D: DeviceClient,
    S: MetricsSink,
{
    pub fn new(device: D, sink: S, settings: ExporterSettings) -> Self {
        Self {
            device,
            sink,
            settings,
            baseline: LogSnapshot::empty(),
            stats: ExporterStats::new(),
        }
    }

    /// Starts from a known baseline instead of an empty one.
    pub fn with_baseline(mut self, baseline: LogSnapshot) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn baseline(&self) -> &LogSnapshot {
        &self.baseline
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// One fetch, diff, forward and rotate step. Never sleeps.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.cycle(None).await
    }

    async fn cycle(&mut self, cancel: Option<&CancellationToken>) -> CycleOutcome {
        self.stats.record_cycle();

        let current = match self.device.fetch_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.stats.record_fetch_failure();
                warn!(
                    device = self.device.address(),
                    error = %e,
                    "Fetching log snapshot failed, keeping previous baseline"
                );
                return CycleOutcome::FetchFailed;
            }
        };

        let delta = LogDelta::between(&self.baseline, &current, self.settings.case);
        let new_lines = delta.len();
        let mut forwarded = 0;
        let mut failed = 0;
        let mut interrupted = false;

        for line in delta.iter() {
            let record = ForwardRecord::new(line, self.device.address(), &self.settings.host);
            let result = match cancel {
                Some(cancel) => tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    result = self.sink.forward(&record) => Some(result),
                },
                None => Some(self.sink.forward(&record).await),
            };

            match result {
                Some(Ok(())) => forwarded += 1,
                Some(Err(e)) => {
                    failed += 1;
                    warn!(error = %e, line, "Forwarding log line failed");
                }
                None => {
                    interrupted = true;
                    break;
                }
            }
        }

        self.stats.record_forwarding(forwarded as u64, failed as u64);

        let fetched = current.len();
        self.baseline = current;

        if interrupted {
            warn!(
                skipped = new_lines - forwarded - failed,
                "Shutdown requested, remaining new lines were not forwarded"
            );
            return CycleOutcome::Interrupted {
                fetched,
                new_lines,
                forwarded,
                failed,
            };
        }

        if new_lines > 0 {
            info!(fetched, new_lines, forwarded, failed, "Poll cycle completed");
        } else {
            debug!(fetched, "Poll cycle completed, no new lines");
        }

        CycleOutcome::Completed {
            fetched,
            new_lines,
            forwarded,
            failed,
        }
    }

    /// Polls until `cancel` fires.
    ///
    /// Cancellation is observed before each cycle, around every forward and
    /// while sleeping. The fetch in flight is bounded only by its timeout.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(
            device = self.device.address(),
            interval = ?self.settings.poll_interval,
            "Starting poll loop"
        );

        while !cancel.is_cancelled() {
            self.cycle(Some(&cancel)).await;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }

        let stats = self.stats();
        info!(
            cycles = stats.cycles,
            fetch_failures = stats.fetch_failures,
            lines_forwarded = stats.lines_forwarded,
            forward_failures = stats.forward_failures,
            "Poll loop stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::FetchError;
    use crate::sink::ForwardError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Device that replays a fixed script; `None` entries fail.
    struct ScriptedDevice {
        script: Mutex<VecDeque<Option<Vec<&'static str>>>>,
    }

    impl ScriptedDevice {
        fn new(script: Vec<Option<Vec<&'static str>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl DeviceClient for ScriptedDevice {
        async fn fetch_snapshot(&self) -> Result<LogSnapshot, FetchError> {
            let next = self.script.lock().unwrap().pop_front().flatten();
            next.map(|lines| lines.into_iter().collect())
                .ok_or(FetchError::HttpStatus { status: 503 })
        }

        fn address(&self) -> &str {
            "fritz.box"
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        attempts: Mutex<Vec<String>>,
        reject: Vec<&'static str>,
    }

    impl MetricsSink for RecordingSink {
        async fn forward(&self, record: &ForwardRecord<'_>) -> Result<(), ForwardError> {
            self.attempts.lock().unwrap().push(record.line.to_string());
            if self.reject.iter().any(|rejected| *rejected == record.line) {
                Err(ForwardError::Rejected { status: 500 })
            } else {
                Ok(())
            }
        }
    }

    fn exporter(
        script: Vec<Option<Vec<&'static str>>>,
        sink: RecordingSink,
    ) -> Exporter<ScriptedDevice, RecordingSink> {
        let settings = ExporterSettings {
            host: "test-host".to_string(),
            ..ExporterSettings::default()
        };
        Exporter::new(ScriptedDevice::new(script), sink, settings)
    }

    fn snapshot(lines: &[&str]) -> LogSnapshot {
        lines.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_first_cycle_forwards_everything() {
        let mut exporter = exporter(vec![Some(vec!["a", "b"])], RecordingSink::default());

        let outcome = exporter.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                fetched: 2,
                new_lines: 2,
                forwarded: 2,
                failed: 0
            }
        );
        assert_eq!(*exporter.sink().attempts.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(exporter.baseline(), &snapshot(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_appended_line_forwarded_once() {
        let mut exporter = exporter(
            vec![Some(vec!["a", "b", "c"]), Some(vec!["a", "b", "c"])],
            RecordingSink::default(),
        )
        .with_baseline(snapshot(&["a", "b"]));

        exporter.run_cycle().await;
        exporter.run_cycle().await;

        assert_eq!(*exporter.sink().attempts.lock().unwrap(), vec!["c"]);
        assert_eq!(exporter.baseline(), &snapshot(&["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_baseline() {
        let mut exporter = exporter(vec![None], RecordingSink::default())
            .with_baseline(snapshot(&["a", "b"]));

        assert_eq!(exporter.run_cycle().await, CycleOutcome::FetchFailed);
        assert_eq!(exporter.baseline(), &snapshot(&["a", "b"]));
        assert!(exporter.sink().attempts.lock().unwrap().is_empty());
        assert_eq!(exporter.stats().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_forward_failure_does_not_block_other_lines() {
        let sink = RecordingSink {
            reject: vec!["y"],
            ..RecordingSink::default()
        };
        let mut exporter = exporter(vec![Some(vec!["x", "y", "z"])], sink);

        let outcome = exporter.run_cycle().await;

        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                fetched: 3,
                new_lines: 3,
                forwarded: 2,
                failed: 1
            }
        );
        assert_eq!(*exporter.sink().attempts.lock().unwrap(), vec!["x", "y", "z"]);
        // Baseline rotates even though one line was not delivered
        assert_eq!(exporter.baseline(), &snapshot(&["x", "y", "z"]));
        assert_eq!(exporter.stats().forward_failures, 1);
    }

    #[tokio::test]
    async fn test_empty_snapshot_clears_baseline() {
        let mut exporter =
            exporter(vec![Some(vec![])], RecordingSink::default()).with_baseline(snapshot(&["a"]));

        let outcome = exporter.run_cycle().await;

        assert!(matches!(outcome, CycleOutcome::Completed { new_lines: 0, .. }));
        assert!(exporter.baseline().is_empty());
        assert!(exporter.sink().attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_cycle_skips_forwarding_but_rotates() {
        let mut exporter = exporter(vec![Some(vec!["a", "b"])], RecordingSink::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = exporter.cycle(Some(&cancel)).await;

        assert_eq!(
            outcome,
            CycleOutcome::Interrupted {
                fetched: 2,
                new_lines: 2,
                forwarded: 0,
                failed: 0
            }
        );
        assert!(exporter.sink().attempts.lock().unwrap().is_empty());
        assert_eq!(exporter.baseline(), &snapshot(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_run_returns_immediately_when_already_cancelled() {
        let mut exporter = exporter(vec![Some(vec!["a"])], RecordingSink::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        exporter.run(cancel).await;

        assert_eq!(exporter.stats().cycles, 0);
        assert!(exporter.baseline().is_empty());
    }
}
