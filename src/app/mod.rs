pub mod config;
pub mod logging_system;
pub mod shutdown;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use logging_system::{LoggingSystem, setup_logging_safe};
pub use shutdown::SignalHandler;

use crate::device::HttpDeviceClient;
use crate::domain::ExporterError;
use crate::exporter::{Exporter, ExporterSettings, StatsSnapshot};
use crate::sink::HttpSink;
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct App {
    exporter: Exporter<HttpDeviceClient, HttpSink>,
}

impl App {
    pub fn from_config(config: Config) -> Result<Self, ExporterError> {
        let device = HttpDeviceClient::new(config.device_config()?)?;
        let sink = HttpSink::new(config.sink_config()?)?;
        let settings = ExporterSettings {
            poll_interval: config.poll_interval(),
            case: config.case_sensitivity(),
            host: ExporterSettings::detect_host(),
        };

        info!("Starting router-log-exporter v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "Configuration: device={}, protocol={:?}, sink={}, interval={:?}, case={:?}, supervised={}",
            device.endpoint(),
            config.protocol,
            sink.target(),
            settings.poll_interval,
            settings.case,
            Config::is_supervised()
        );

        Ok(Self {
            exporter: Exporter::new(device, sink, settings),
        })
    }

    /// Runs until SIGINT/SIGTERM, then returns the final counters.
    pub async fn run(mut self) -> Result<StatsSnapshot, ExporterError> {
        let signals = SignalHandler::install(CancellationToken::new())?;

        info!("router-log-exporter is running. Press Ctrl+C to stop.");
        self.exporter.run(signals.token()).await;
        info!("router-log-exporter stopped.");

        Ok(self.exporter.stats())
    }
}

// Main entry point for the application
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = match Config::load(std::env::args_os()) {
        Ok(config) => config,
        // Covers --help and --version as well as usage errors
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = setup_logging_safe(config.log_level, config.log_format) {
        eprintln!("{e}");
        process::exit(1);
    }

    match App::from_config(config) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("Application error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Startup error: {}", e);
            process::exit(1);
        }
    }

    Ok(())
}
