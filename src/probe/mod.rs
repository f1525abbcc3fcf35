//! Probe module for endpoint monitoring.
//!
//! Probes issue one HTTP GET per tick and turn the outcome into a
//! [`Sample`]. Failures are data, not errors: anything other than a
//! 2xx/3xx response becomes an unavailable sample with no latency.

mod http;

pub use http::*;

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::monitor::{Sample, Target};

/// Default connect timeout for HTTP probes.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 1000;
/// Default overall request timeout for HTTP probes.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Probe configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Whether a status code counts as the endpoint being available.
pub fn is_available_status(code: u16) -> bool {
    (200..=399).contains(&code)
}

/// Turn a probe outcome into a sample taken at `timestamp`.
pub fn classify(timestamp: DateTime<Utc>, outcome: Result<HttpResponse, ProbeError>) -> Sample {
    match outcome {
        Ok(resp) if is_available_status(resp.status) => {
            Sample::up(timestamp, resp.latency, resp.status)
        }
        Ok(resp) => Sample::down(timestamp, Some(resp.status)),
        Err(_) => Sample::down(timestamp, None),
    }
}

/// Probe a target once.
pub async fn run_probe(probe: &HttpProbe, target: &Target) -> Sample {
    // Add jitter to avoid thundering herd
    let jitter = rand::random::<u64>() % 100;
    tokio::time::sleep(Duration::from_millis(jitter)).await;

    let timestamp = Utc::now();
    let outcome = probe.fetch(target.url()).await;
    if let Err(e) = &outcome {
        tracing::debug!("Probe failed for {}: {}", target.url(), e);
    }

    classify(timestamp, outcome)
}
