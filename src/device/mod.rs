//! Router side of the exporter: fetching full log snapshots.

pub mod http;
pub mod tr064;

pub use http::HttpDeviceClient;

use crate::domain::LogSnapshot;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid device address: {0}")]
    InvalidAddress(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),
    #[error("Device rejected credentials (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("HTTP error: {status}")]
    HttpStatus { status: u16 },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Wire protocol used to read the device log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProtocol {
    /// TR-064 SOAP `GetDeviceLog` action (Fritz!Box and compatibles)
    #[default]
    Tr064,
    /// Plain HTTP GET returning the log as text, one entry per line
    Plain,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub address: String,
    pub user: Option<String>,
    pub password: String,
    #[serde(default)]
    pub protocol: DeviceProtocol,
    #[serde(with = "crate::app::config::serde_helpers", default = "default_timeout")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            user: None,
            password: String::new(),
            protocol: DeviceProtocol::default(),
            timeout: default_timeout(),
        }
    }
}

impl std::fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("protocol", &self.protocol)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Capability to read the full device log.
///
/// Implementations hold an already-authenticated handle; every call returns
/// the complete log as of that moment.
pub trait DeviceClient: Send + Sync {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<LogSnapshot, FetchError>> + Send;

    /// Address used to tag forwarded records.
    fn address(&self) -> &str;
}
