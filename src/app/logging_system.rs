use super::config::{LogFormat, LogLevel};
use crate::domain::ExporterError;
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Third-party targets that are far too chatty at `info` and below.
const QUIET_TARGETS: &[(&str, LogLevel)] = &[
    ("hyper", LogLevel::Warn),
    ("hyper_util", LogLevel::Warn),
    ("reqwest", LogLevel::Warn),
    ("h2", LogLevel::Warn),
    ("rustls", LogLevel::Warn),
];

pub struct LoggingSystem {
    directives: Vec<String>,
    format: LogFormat,
}

impl LoggingSystem {
    pub fn new(format: LogFormat) -> Self {
        Self {
            directives: QUIET_TARGETS
                .iter()
                .map(|(target, level)| format!("{target}={}", level.as_str()))
                .collect(),
            format,
        }
    }

    /// Default level first, then per-target directives.
    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let mut parts = Vec::with_capacity(self.directives.len() + 1);
        parts.push(default_level.as_str().to_string());
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }

    /// `RUST_LOG` wins over the configured level when it is set and valid.
    fn env_filter(&self, default_level: LogLevel) -> Result<EnvFilter, ExporterError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }

        let filter_string = self.build_filter_string(default_level);
        EnvFilter::try_new(&filter_string).map_err(|e| {
            ExporterError::Logging(format!("invalid filter '{filter_string}': {e}"))
        })
    }

    pub fn initialize_tracing(&self, default_level: LogLevel) -> Result<(), ExporterError> {
        let env_filter = self.env_filter(default_level)?;
        let registry = tracing_subscriber::registry().with(env_filter);

        let result = match self.format {
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_ansi(false)
                        .compact(),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_current_span(false)
                        .flatten_event(true),
                )
                .try_init(),
        };

        result.map_err(|e| ExporterError::Logging(e.to_string()))
    }
}

/// Installs the global subscriber once; later calls report the first outcome.
pub fn setup_logging_safe(level: LogLevel, format: LogFormat) -> Result<(), ExporterError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    INIT.get_or_init(|| {
        LoggingSystem::new(format)
            .initialize_tracing(level)
            .map_err(|e| e.to_string())
    })
    .clone()
    .map_err(ExporterError::Logging)
}
