use crate::domain::ExporterError;
use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal as unix_signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels a token on SIGINT, or SIGTERM on unix.
#[derive(Debug)]
pub struct SignalHandler {
    token: CancellationToken,
}

impl SignalHandler {
    /// Registers the handlers; must be called from within a Tokio runtime.
    pub fn install(token: CancellationToken) -> Result<Self, ExporterError> {
        let signals = ShutdownSignals::register()?;

        let task_token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => return,
                () = signals.wait() => {}
            }
            task_token.cancel();
        });

        Ok(Self { token })
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct ShutdownSignals {
    #[cfg(unix)]
    sigterm: Signal,
}

impl ShutdownSignals {
    fn register() -> Result<Self, ExporterError> {
        Ok(Self {
            #[cfg(unix)]
            sigterm: unix_signal(SignalKind::terminate()).map_err(|e| {
                ExporterError::Shutdown(format!("Failed to create SIGTERM handler: {e}"))
            })?,
        })
    }

    #[cfg(unix)]
    async fn wait(mut self) {
        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
                Err(err) => {
                    error!("Failed to listen for SIGINT: {}", err);
                    self.sigterm.recv().await;
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
            },
            _ = self.sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait(self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
            Err(err) => {
                error!("Failed to listen for SIGINT: {}", err);
                std::future::pending::<()>().await;
            }
        }
    }
}
