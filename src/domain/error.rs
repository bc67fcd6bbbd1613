use thiserror::Error;

/// Top-level error type for the exporter.
///
/// Only `Config` and `Logging` are fatal; fetch and forward failures are
/// recovered inside the poll loop and surface here only when a caller
/// drives a device client or sink directly.
#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::app::ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crate::device::FetchError),

    #[error("Forward error: {0}")]
    Forward(#[from] crate::sink::ForwardError),

    #[error("Logging initialization failed: {0}")]
    Logging(String),

    #[error("Shutdown error: {0}")]
    Shutdown(String),
}
