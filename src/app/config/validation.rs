use super::{Config, ConfigError};
use crate::device::HttpDeviceClient;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate device address
        let address = self.required_address()?;
        HttpDeviceClient::resolve_endpoint(address, self.protocol)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid device address: {e}")))?;

        self.required_password()?;

        // Validate sink target
        if self.sink_port == 0 {
            return Err(ConfigError::InvalidConfig(
                "Sink port must be greater than 0".to_string(),
            ));
        }
        let sink = self.sink_config()?;
        sink.target_url()
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid sink URI: {e}")))?;

        // Validate timing
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Poll interval must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        // Validate retry config
        self.retry
            .validate()
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        Ok(())
    }
}
