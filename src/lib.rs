#![deny(rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_possible_truncation, // Millisecond durations stay well inside u64
    clippy::cast_precision_loss,      // Jitter factor math on small durations
    clippy::cast_sign_loss,           // Jittered delays are never negative
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. DeviceConfig in device module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod device;
pub mod domain;
pub mod exporter;
pub mod reliability;
pub mod sink;

// Re-export main types for easy access
pub use app::{App, Config};
pub use domain::{CaseSensitivity, ExporterError, ForwardRecord, LogDelta, LogSnapshot};
pub use exporter::{CycleOutcome, Exporter, ExporterSettings};
