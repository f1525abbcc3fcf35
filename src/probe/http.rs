//! HTTP probe implementation.

use std::time::{Duration, Instant};

use super::{ProbeConfig, ProbeError};

/// Status and timing of one HTTP response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub latency: Duration,
}

/// HTTP prober holding a reusable client.
///
/// Redirects are not followed so that 3xx responses are reported as such.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.request_timeout,
        })
    }

    /// Send one GET to `url`.
    ///
    /// Latency covers the time until response headers arrive.
    pub async fn fetch(&self, url: &str) -> Result<HttpResponse, ProbeError> {
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.timeout)
            } else {
                ProbeError::Network(e.to_string())
            }
        })?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
            latency: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_probe_invalid_url() {
        let probe = HttpProbe::new(&ProbeConfig {
            connect_timeout: Duration::from_millis(100),
            request_timeout: Duration::from_millis(100),
        })
        .unwrap();

        let result = probe.fetch("http://256.256.256.256").await;
        assert!(result.is_err());
    }
}
