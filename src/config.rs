//! Configuration module for uptrail.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Targets come from `UPTRAIL_TARGETS` or, when that is unset, from lines
//! of `<host> <interval_ms>` on standard input.

use std::env;
use std::io::BufRead;
use std::time::Duration;
use thiserror::Error;

use crate::monitor::{AggregatorConfig, MonitorError, Target, ALERT_THRESHOLD};
use crate::probe::{ProbeConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS};

/// Configuration error types.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("expected \"<host> <interval_ms>\", got {0:?}")]
    InvalidLine(String),
    #[error("invalid probe interval {0:?}: expected a positive number of milliseconds")]
    InvalidInterval(String),
    #[error(transparent)]
    Target(#[from] MonitorError),
}

/// Monitor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// HTTP port for the status API, 0 to disable (default: 8080)
    pub http_port: u16,
    /// Connect timeout for each probe (default: 1000 ms)
    pub connect_timeout: Duration,
    /// Overall timeout for each probe (default: 10000 ms)
    pub request_timeout: Duration,
    /// Availability ratio below which a target alerts (default: 0.8)
    pub alert_threshold: f64,
    /// Targets to monitor
    pub targets: Vec<Target>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            alert_threshold: ALERT_THRESHOLD,
            targets: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `UPTRAIL_HTTP_PORT`: status API port, 0 disables it (default: 8080)
    /// - `UPTRAIL_TARGETS`: `<host> <interval_ms>` pairs separated by `,` or `;`
    /// - `UPTRAIL_PROBE_TIMEOUT_MS`: connect timeout (default: 1000)
    /// - `UPTRAIL_REQUEST_TIMEOUT_MS`: overall request timeout (default: 10000)
    /// - `UPTRAIL_ALERT_THRESHOLD`: ratio in (0, 1] (default: 0.8)
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("UPTRAIL_HTTP_PORT").and_then(|s| s.trim().parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(ms) = lookup("UPTRAIL_PROBE_TIMEOUT_MS").and_then(|s| parse_millis(&s)) {
            cfg.connect_timeout = ms;
        }

        if let Some(ms) = lookup("UPTRAIL_REQUEST_TIMEOUT_MS").and_then(|s| parse_millis(&s)) {
            cfg.request_timeout = ms;
        }

        if let Some(raw) = lookup("UPTRAIL_ALERT_THRESHOLD") {
            match raw.trim().parse::<f64>() {
                Ok(t) if t > 0.0 && t <= 1.0 => cfg.alert_threshold = t,
                _ => tracing::warn!(
                    "Ignoring UPTRAIL_ALERT_THRESHOLD={:?}, using {}",
                    raw,
                    cfg.alert_threshold
                ),
            }
        }

        if let Some(raw) = lookup("UPTRAIL_TARGETS") {
            cfg.targets = parse_target_list(&raw)?;
        }

        Ok(cfg)
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            alert_threshold: self.alert_threshold,
            ..Default::default()
        }
    }
}

fn parse_millis(s: &str) -> Option<Duration> {
    match s.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => None,
    }
}

/// Parse one `<host> <interval_ms>` line, e.g. `www.google.com 800`.
pub fn parse_target_line(line: &str) -> Result<Target, ConfigError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [address, interval] = parts.as_slice() else {
        return Err(ConfigError::InvalidLine(line.to_string()));
    };

    let interval = parse_millis(interval).ok_or_else(|| ConfigError::InvalidInterval(interval.to_string()))?;

    Ok(Target::new(address, interval)?)
}

/// Parse a `,` or `;` separated list of target lines. Blank items are skipped.
pub fn parse_target_list(raw: &str) -> Result<Vec<Target>, ConfigError> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_target_line)
        .collect()
}

/// Read target lines until a blank line or end of input.
///
/// Invalid lines are reported and skipped.
pub fn read_targets<R: BufRead>(reader: R) -> Vec<Target> {
    let mut targets = Vec::new();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!("Failed to read target input: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            break;
        }

        match parse_target_line(&line) {
            Ok(target) => targets.push(target),
            Err(e) => tracing::warn!("Skipping target: {}", e),
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.connect_timeout, Duration::from_millis(1000));
        assert_eq!(cfg.alert_threshold, 0.8);
        assert!(cfg.targets.is_empty());
    }

    #[test]
    fn test_load_from_env() {
        let cfg = MonitorConfig::from_lookup(lookup_from(&[
            ("UPTRAIL_HTTP_PORT", "0"),
            ("UPTRAIL_PROBE_TIMEOUT_MS", "250"),
            ("UPTRAIL_ALERT_THRESHOLD", "0.95"),
            ("UPTRAIL_TARGETS", "www.google.com 800; github.com 1000"),
        ]))
        .unwrap();

        assert_eq!(cfg.http_port, 0);
        assert_eq!(cfg.probe_config().connect_timeout, Duration::from_millis(250));
        assert_eq!(cfg.aggregator_config().alert_threshold, 0.95);
        assert_eq!(cfg.targets.len(), 2);
        assert_eq!(cfg.targets[1].url(), "http://github.com/");
        assert_eq!(cfg.targets[1].interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let cfg = MonitorConfig::from_lookup(lookup_from(&[
            ("UPTRAIL_HTTP_PORT", "not-a-port"),
            ("UPTRAIL_PROBE_TIMEOUT_MS", "0"),
            ("UPTRAIL_ALERT_THRESHOLD", "1.5"),
        ]))
        .unwrap();

        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.connect_timeout, Duration::from_millis(1000));
        assert_eq!(cfg.alert_threshold, 0.8);
    }

    #[test]
    fn test_invalid_target_list_is_an_error() {
        let result = MonitorConfig::from_lookup(lookup_from(&[("UPTRAIL_TARGETS", "google.com fast")]));
        assert!(matches!(result, Err(ConfigError::InvalidInterval(_))));
    }

    #[test]
    fn test_parse_target_line() {
        let target = parse_target_line("www.google.com 800").unwrap();
        assert_eq!(target.url(), "http://www.google.com/");
        assert_eq!(target.interval(), Duration::from_millis(800));

        assert!(matches!(parse_target_line("github.com"), Err(ConfigError::InvalidLine(_))));
        assert!(matches!(parse_target_line("a b c"), Err(ConfigError::InvalidLine(_))));
        assert!(matches!(
            parse_target_line("github.com -5"),
            Err(ConfigError::InvalidInterval(_))
        ));
        assert!(matches!(parse_target_line("http:// 5"), Err(ConfigError::Target(_))));
    }

    #[test]
    fn test_read_targets_stops_at_blank_line() {
        let input = "www.google.com 800\nnot valid\ngithub.com 1000\n\nexample.com 500\n";
        let targets = read_targets(input.as_bytes());

        let urls: Vec<_> = targets.iter().map(|t| t.url()).collect();
        assert_eq!(urls, vec!["http://www.google.com/", "http://github.com/"]);
    }
}
