//! Domain layer for router-log-exporter.
//!
//! Contains the canonical types shared across all modules:
//! - `LogSnapshot`: one full capture of the device log
//! - `LogDelta`: lines of a snapshot that the previous one did not contain
//! - `ForwardRecord`: the per-line payload handed to a sink
//! - `ExporterError`: Top-level error type

pub mod error;
pub mod record;
pub mod snapshot;

pub use error::ExporterError;
pub use record::ForwardRecord;
pub use snapshot::{CaseSensitivity, LogDelta, LogSnapshot};
