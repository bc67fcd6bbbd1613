//! Delivery side of the exporter: pushing delta lines to a metrics/log sink.

pub mod http;

pub use http::HttpSink;

use crate::domain::ForwardRecord;
use crate::reliability::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SINK_PORT: u16 = 9090;

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("Invalid sink target: {0}")]
    InvalidTarget(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),
    #[error("Sink rejected record: HTTP {status}")]
    Rejected { status: u16 },
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ForwardError>,
    },
}

impl ForwardError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ForwardError::Network(_) | ForwardError::Timeout(_) => true,
            ForwardError::Rejected { status } => *status == 429 || *status >= 500,
            ForwardError::InvalidTarget(_)
            | ForwardError::Serialization(_)
            | ForwardError::RetriesExhausted { .. } => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub uri: String,
    /// Used only when `uri` carries no port of its own
    pub port: u16,
    #[serde(with = "crate::app::config::serde_helpers")]
    pub timeout: Duration,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            port: DEFAULT_SINK_PORT,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl SinkConfig {
    /// The URI with `port` filled in; bare hosts are treated as `http://`.
    ///
    /// A port written in the URI wins. The scheme's default port (`:80`,
    /// `:443`) is indistinguishable from no port and gets replaced.
    pub fn target_url(&self) -> Result<Url, ForwardError> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(ForwardError::InvalidTarget("sink URI is empty".to_string()));
        }

        let candidate = if uri.contains("://") {
            uri.to_string()
        } else {
            format!("http://{uri}")
        };
        let mut url =
            Url::parse(&candidate).map_err(|e| ForwardError::InvalidTarget(format!("'{uri}': {e}")))?;
        if url.port().is_none() {
            url.set_port(Some(self.port)).map_err(|()| {
                ForwardError::InvalidTarget(format!("'{uri}' cannot carry a port"))
            })?;
        }

        Ok(url)
    }
}

/// Capability to deliver one record to the sink.
pub trait MetricsSink: Send + Sync {
    fn forward(
        &self,
        record: &ForwardRecord<'_>,
    ) -> impl Future<Output = Result<(), ForwardError>> + Send;
}
