use super::{DeviceClient, DeviceConfig, DeviceProtocol, FetchError, tr064};
use crate::domain::LogSnapshot;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use std::time::Instant;
use tracing::debug;
use url::Url;

/// Device client speaking HTTP, either TR-064 SOAP or a plain text endpoint.
#[derive(Debug, Clone)]
pub struct HttpDeviceClient {
    client: Client,
    config: DeviceConfig,
    endpoint: Url,
}

impl HttpDeviceClient {
    pub fn new(config: DeviceConfig) -> Result<Self, FetchError> {
        let endpoint = Self::resolve_endpoint(&config.address, config.protocol)?;

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(format!("router-log-exporter/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// Turns a configured address into the URL that is actually requested.
    ///
    /// Bare hosts get `http://`; for TR-064 they also get port 49000 and the
    /// `DeviceInfo` control path unless the address already carries a path.
    pub fn resolve_endpoint(address: &str, protocol: DeviceProtocol) -> Result<Url, FetchError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(FetchError::InvalidAddress(
                "device address is empty".to_string(),
            ));
        }

        let has_scheme = address.contains("://");
        let candidate = if has_scheme {
            address.to_string()
        } else {
            format!("http://{address}")
        };
        let mut url = Url::parse(&candidate)
            .map_err(|e| FetchError::InvalidAddress(format!("'{address}': {e}")))?;

        if protocol == DeviceProtocol::Tr064 {
            if !has_scheme && url.port().is_none() {
                url.set_port(Some(tr064::DEFAULT_PORT)).map_err(|()| {
                    FetchError::InvalidAddress(format!("'{address}' cannot carry a port"))
                })?;
            }
            if url.path() == "/" {
                url.set_path(tr064::CONTROL_PATH);
            }
        }

        Ok(url)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn build_request(&self) -> RequestBuilder {
        let request = match self.config.protocol {
            DeviceProtocol::Tr064 => self
                .client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, "text/xml; charset=\"utf-8\"")
                .header("SOAPACTION", tr064::soap_action())
                .body(tr064::request_envelope()),
            DeviceProtocol::Plain => self.client.get(self.endpoint.clone()),
        };

        if self.config.password.is_empty() {
            request
        } else {
            request.basic_auth(
                self.config.user.as_deref().unwrap_or_default(),
                Some(&self.config.password),
            )
        }
    }
}

impl DeviceClient for HttpDeviceClient {
    async fn fetch_snapshot(&self) -> Result<LogSnapshot, FetchError> {
        let start = Instant::now();

        let response = self.build_request().send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.config.timeout)
            } else {
                FetchError::Network(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let snapshot = match self.config.protocol {
            DeviceProtocol::Tr064 => tr064::parse_device_log(&body)?,
            DeviceProtocol::Plain => LogSnapshot::from_text(&body),
        };

        debug!(
            "Fetched {} log lines from {} in {:?}",
            snapshot.len(),
            self.endpoint,
            start.elapsed()
        );

        Ok(snapshot)
    }

    fn address(&self) -> &str {
        &self.config.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_tr064_defaults() {
        let url = HttpDeviceClient::resolve_endpoint("192.168.178.1", DeviceProtocol::Tr064).unwrap();
        assert_eq!(url.as_str(), "http://192.168.178.1:49000/upnp/control/deviceinfo");
    }

    #[test]
    fn test_explicit_url_is_respected() {
        let url =
            HttpDeviceClient::resolve_endpoint("https://fritz.box:49443", DeviceProtocol::Tr064)
                .unwrap();
        assert_eq!(url.as_str(), "https://fritz.box:49443/upnp/control/deviceinfo");

        let plain =
            HttpDeviceClient::resolve_endpoint("http://router.lan/syslog.txt", DeviceProtocol::Plain)
                .unwrap();
        assert_eq!(plain.as_str(), "http://router.lan/syslog.txt");
    }

    #[test]
    fn test_empty_address_is_rejected() {
        assert!(matches!(
            HttpDeviceClient::resolve_endpoint("  ", DeviceProtocol::Plain),
            Err(FetchError::InvalidAddress(_))
        ));
    }
}
