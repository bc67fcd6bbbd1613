use super::serde_helpers::{load_env_enum, load_env_string_opt, load_env_var, require_env};
use super::{ConfigError, DeviceProtocol, LogFormat, LogLevel};
use crate::device::DeviceConfig;
use crate::domain::CaseSensitivity;
use crate::reliability::RetryPolicy;
use crate::sink::{DEFAULT_SINK_PORT, SinkConfig};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable systemd sets for every unit it starts.
pub const SUPERVISOR_MARKER: &str = "INVOCATION_ID";

#[derive(Parser, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Router address (host, host:port or full URL)
    #[arg(long, env = "FRITZBOX")]
    pub address: Option<String>,

    /// Router user name (may be empty)
    #[arg(long, env = "FB_USER")]
    pub user: Option<String>,

    /// Router password
    #[arg(long, env = "FB_PASS", hide_env_values = true)]
    pub password: Option<String>,

    /// Protocol used to read the router log
    #[arg(long, env = "DEVICE_PROTOCOL", default_value = "tr064")]
    pub protocol: DeviceProtocol,

    /// Sink URI new log lines are forwarded to
    #[arg(long, env = "PROMETHEUS_URI")]
    pub sink_uri: Option<String>,

    /// Sink port
    #[arg(long, env = "PROMETHEUS_PORT", default_value = "9090")]
    pub sink_port: u16,

    /// Seconds between two polls of the router
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "60")]
    pub poll_interval_secs: u64,

    /// Compare log lines case-insensitively when detecting new entries
    #[arg(long, env = "IGNORE_CASE")]
    pub ignore_case: bool,

    /// Timeout for each request to the router or the sink, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional, TOML)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Sink retry policy (not exposed as CLI args)
    #[arg(skip)]
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: None,
            user: None,
            password: None,
            protocol: DeviceProtocol::Tr064,
            sink_uri: None,
            sink_port: DEFAULT_SINK_PORT,
            poll_interval_secs: 60,
            ignore_case: false,
            request_timeout_secs: 10,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("protocol", &self.protocol)
            .field("sink_uri", &self.sink_uri)
            .field("sink_port", &self.sink_port)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("ignore_case", &self.ignore_case)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("config_file", &self.config_file)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    /// Builds the startup configuration.
    ///
    /// Under systemd (`INVOCATION_ID` set) everything comes from the
    /// environment; otherwise from the command line, which may in turn point
    /// at a TOML file.
    pub fn load<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        if Self::is_supervised() {
            Self::from_supervisor_env()
        } else {
            Self::from_args(args)
        }
    }

    pub fn is_supervised() -> bool {
        std::env::var_os(SUPERVISOR_MARKER).is_some()
    }

    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::try_parse_from(args)?;

        if let Some(config_file) = &config.config_file {
            return Self::from_file(config_file);
        }

        config.validate()?;
        Ok(config)
    }

    /// Environment-only configuration used when running as a service.
    ///
    /// Address, password and sink URI must be present; a missing one is an
    /// error rather than an empty default.
    pub fn from_supervisor_env() -> Result<Self, ConfigError> {
        let mut config = Config {
            address: Some(require_env("FRITZBOX")?),
            password: Some(require_env("FB_PASS")?),
            sink_uri: Some(require_env("PROMETHEUS_URI")?),
            ..Config::default()
        };

        load_env_string_opt("FB_USER", &mut config.user);
        load_env_var("PROMETHEUS_PORT", &mut config.sink_port)?;
        load_env_enum("DEVICE_PROTOCOL", &mut config.protocol)?;
        load_env_var("POLL_INTERVAL_SECS", &mut config.poll_interval_secs)?;
        load_env_var("IGNORE_CASE", &mut config.ignore_case)?;
        load_env_var("REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;
        load_env_enum("LOG_LEVEL", &mut config.log_level)?;
        load_env_enum("LOG_FORMAT", &mut config.log_format)?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;
        config.config_file = Some(path.as_ref().to_path_buf());
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        CaseSensitivity::from(self.ignore_case)
    }

    pub fn device_config(&self) -> Result<DeviceConfig, ConfigError> {
        Ok(DeviceConfig {
            address: self.required_address()?.to_string(),
            user: self.user.clone(),
            password: self.required_password()?.to_string(),
            protocol: self.protocol,
            timeout: self.request_timeout(),
        })
    }

    pub fn sink_config(&self) -> Result<SinkConfig, ConfigError> {
        Ok(SinkConfig {
            uri: self.required_sink_uri()?.to_string(),
            port: self.sink_port,
            timeout: self.request_timeout(),
            retry: self.retry.clone(),
        })
    }

    pub(super) fn required_address(&self) -> Result<&str, ConfigError> {
        non_empty(self.address.as_deref(), "device address (--address / FRITZBOX)")
    }

    pub(super) fn required_password(&self) -> Result<&str, ConfigError> {
        non_empty(self.password.as_deref(), "device password (--password / FB_PASS)")
    }

    pub(super) fn required_sink_uri(&self) -> Result<&str, ConfigError> {
        non_empty(self.sink_uri.as_deref(), "sink URI (--sink-uri / PROMETHEUS_URI)")
    }
}

fn non_empty<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::InvalidConfig(format!("{what} is required"))),
    }
}
