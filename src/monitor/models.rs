//! Monitor model types.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use super::{AlertEvent, AlertState, MonitorError, StatusCount};

/// Window over which alert availability is evaluated.
pub const ALERT_CHECK_WINDOW_SECS: i64 = 2 * 60;
/// Availability ratio below which a target is considered down.
pub const ALERT_THRESHOLD: f64 = 0.8;
/// Window covered by the short report.
pub const SHORT_TRACE_WINDOW_SECS: i64 = 10 * 60;
/// Window covered by the long report.
pub const LONG_TRACE_WINDOW_SECS: i64 = 60 * 60;

/// A monitored endpoint.
///
/// Identity is the normalized URL; two targets with the same URL are equal
/// regardless of their probe interval.
#[derive(Debug, Clone)]
pub struct Target {
    url: String,
    interval: Duration,
}

impl Target {
    /// Create a target from an address such as `www.google.com` or
    /// `https://github.com/status`.
    pub fn new(address: &str, interval: Duration) -> Result<Self, MonitorError> {
        if interval.is_zero() {
            return Err(MonitorError::InvalidTarget {
                address: address.to_string(),
                reason: "probe interval must be positive".to_string(),
            });
        }

        Ok(Self {
            url: normalize_url(address)?,
            interval,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl PartialEq for Target {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Target {}

impl Hash for Target {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// Normalize an endpoint address into a canonical URL string.
///
/// Bare hosts get an `http://` scheme.
pub fn normalize_url(address: &str) -> Result<String, MonitorError> {
    let trimmed = address.trim();
    let invalid = |reason: String| MonitorError::InvalidTarget {
        address: trimmed.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("address is empty".to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = reqwest::Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url.to_string())
}

/// One probe observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub available: bool,
    /// Response latency, or `None` when the probe produced no usable timing.
    pub latency: Option<Duration>,
    /// HTTP status, or `None` when no response was received.
    pub status: Option<u16>,
}

impl Sample {
    /// A successful probe.
    pub fn up(timestamp: DateTime<Utc>, latency: Duration, status: u16) -> Self {
        Self {
            timestamp,
            available: true,
            latency: Some(latency),
            status: Some(status),
        }
    }

    /// A failed probe, with the status if a response arrived at all.
    pub fn down(timestamp: DateTime<Utc>, status: Option<u16>) -> Self {
        Self {
            timestamp,
            available: false,
            latency: None,
            status,
        }
    }
}

/// Query window for snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceWindow {
    Short,
    Long,
}

impl TraceWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceWindow::Short => "short",
            TraceWindow::Long => "long",
        }
    }
}

/// Window and threshold settings shared by every aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    pub alert_window: ChronoDuration,
    pub alert_threshold: f64,
    pub short_window: ChronoDuration,
    pub long_window: ChronoDuration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            alert_window: ChronoDuration::seconds(ALERT_CHECK_WINDOW_SECS),
            alert_threshold: ALERT_THRESHOLD,
            short_window: ChronoDuration::seconds(SHORT_TRACE_WINDOW_SECS),
            long_window: ChronoDuration::seconds(LONG_TRACE_WINDOW_SECS),
        }
    }
}

impl AggregatorConfig {
    /// How long samples are kept: the longest window anything queries.
    pub fn retention(&self) -> ChronoDuration {
        self.alert_window.max(self.short_window).max(self.long_window)
    }

    pub fn window(&self, window: TraceWindow) -> ChronoDuration {
        match window {
            TraceWindow::Short => self.short_window,
            TraceWindow::Long => self.long_window,
        }
    }
}

/// Metrics computed for one target over one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub target: String,
    pub interval_ms: u64,
    pub window: TraceWindow,
    pub window_minutes: i64,
    pub latest_sample: Option<DateTime<Utc>>,
    pub sample_count: usize,
    /// Percentage of available samples, 0-100.
    pub availability: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub min_latency_ms: f64,
    pub status_counts: Vec<StatusCount>,
    pub alert_state: AlertState,
    /// Complete transition history, never windowed.
    pub alerts: Vec<AlertEvent>,
}
