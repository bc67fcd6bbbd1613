use super::{ForwardError, MetricsSink, SinkConfig};
use crate::domain::ForwardRecord;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};
use url::Url;

/// Sink that POSTs each record as a JSON document.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: Client,
    config: SinkConfig,
    target: Url,
}

impl HttpSink {
    pub fn new(config: SinkConfig) -> Result<Self, ForwardError> {
        let target = config.target_url()?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(format!("router-log-exporter/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            target,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    async fn send_once(&self, body: &str) -> Result<(), ForwardError> {
        let response = self
            .client
            .post(self.target.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ForwardError::Timeout(self.config.timeout)
                } else {
                    ForwardError::Network(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ForwardError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

impl MetricsSink for HttpSink {
    async fn forward(&self, record: &ForwardRecord<'_>) -> Result<(), ForwardError> {
        let body = record
            .to_json()
            .map_err(|e| ForwardError::Serialization(e.to_string()))?;
        let policy = &self.config.retry;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.send_once(&body).await {
                Ok(()) => {
                    debug!("Forwarded line to {} (attempt {})", self.target, attempts);
                    return Ok(());
                }
                Err(e) if e.is_retryable() && policy.should_retry(attempts) => {
                    let delay = policy.calculate_delay(attempts - 1);
                    warn!(
                        "Forward attempt {} failed: {}; retrying in {:?}",
                        attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_retryable() && attempts > 1 => {
                    return Err(ForwardError::RetriesExhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}
