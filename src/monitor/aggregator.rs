//! Per-target aggregation of probe samples.

use parking_lot::Mutex;
use std::time::Duration;

use super::{
    AggregatorConfig, AlertEngine, AlertEvent, AlertState, MetricsSnapshot, MonitorError,
    RollingSeries, Sample, StatusHistogram, Target, TraceWindow,
};

/// Rolling metrics and alert state for a single target.
///
/// `ingest` and `snapshot` each hold the internal lock for their whole
/// duration, so a snapshot never observes a half-applied sample.
#[derive(Debug)]
pub struct TargetAggregator {
    target: Target,
    config: AggregatorConfig,
    state: Mutex<AggregatorState>,
}

#[derive(Debug)]
struct AggregatorState {
    availability: RollingSeries<bool>,
    latency: RollingSeries<Option<Duration>>,
    status: RollingSeries<Option<u16>>,
    histogram: StatusHistogram,
    alerts: AlertEngine,
}

impl TargetAggregator {
    pub fn new(target: Target, config: AggregatorConfig) -> Self {
        let retention = config.retention();
        Self {
            target,
            config,
            state: Mutex::new(AggregatorState {
                availability: RollingSeries::new(retention),
                latency: RollingSeries::new(retention),
                status: RollingSeries::new(retention),
                histogram: StatusHistogram::new(),
                alerts: AlertEngine::new(config.alert_threshold),
            }),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Record a probe sample.
    ///
    /// Returns the alert transition this sample caused, if any.
    pub fn ingest(&self, sample: Sample) -> Result<Option<AlertEvent>, MonitorError> {
        let mut state = self.state.lock();
        state.ingest(&self.target, &self.config, sample)
    }

    /// Compute metrics over the given window.
    pub fn snapshot(&self, window: TraceWindow) -> MetricsSnapshot {
        let state = self.state.lock();
        state.snapshot(&self.target, &self.config, window)
    }

    pub fn alert_state(&self) -> AlertState {
        self.state.lock().alerts.state()
    }

    pub fn alert_history(&self) -> Vec<AlertEvent> {
        self.state.lock().alerts.history().to_vec()
    }

    pub fn sample_count(&self) -> usize {
        self.state.lock().availability.len()
    }
}

impl AggregatorState {
    fn ingest(
        &mut self,
        target: &Target,
        config: &AggregatorConfig,
        sample: Sample,
    ) -> Result<Option<AlertEvent>, MonitorError> {
        let now = sample.timestamp;

        // Reject before touching any series so the three stay aligned
        if let Some(latest) = self.availability.latest_timestamp() {
            if now < latest {
                return Err(MonitorError::OutOfOrder {
                    latest,
                    received: now,
                });
            }
        }

        self.availability.append(sample.available, now)?;

        let latency = if sample.available { sample.latency } else { None };
        self.latency.append(latency, now)?;

        let evicted = self.status.append(sample.status, now)?;
        self.histogram.record(sample.status);
        for entry in evicted {
            self.histogram.unrecord(entry.value)?;
        }
        debug_assert_eq!(self.histogram.total(), self.status.len());

        if self.availability.span() < config.alert_window {
            return Ok(None);
        }

        Ok(self.alerts.evaluate(
            target.url(),
            self.availability.window(config.alert_window),
            now,
        ))
    }

    fn snapshot(
        &self,
        target: &Target,
        config: &AggregatorConfig,
        window: TraceWindow,
    ) -> MetricsSnapshot {
        let span = config.window(window);

        let (up, total) = self
            .availability
            .window(span)
            .fold((0usize, 0usize), |(up, total), e| (up + usize::from(e.value), total + 1));
        let availability = if total == 0 {
            0.0
        } else {
            100.0 * up as f64 / total as f64
        };

        let latency = LatencyStats::collect(self.latency.window(span).map(|e| e.value));

        // The incremental histogram already covers full retention
        let status_counts = if span >= config.retention() {
            self.histogram.to_counts()
        } else {
            StatusHistogram::windowed_counts(self.status.window(span)).to_counts()
        };

        MetricsSnapshot {
            target: target.url().to_string(),
            interval_ms: u64::try_from(target.interval().as_millis()).unwrap_or(u64::MAX),
            window,
            window_minutes: span.num_minutes(),
            latest_sample: self.availability.latest_timestamp(),
            sample_count: total,
            availability,
            avg_latency_ms: latency.avg_ms,
            max_latency_ms: latency.max_ms,
            min_latency_ms: latency.min_ms,
            status_counts,
            alert_state: self.alerts.state(),
            alerts: self.alerts.history().to_vec(),
        }
    }
}

/// Latency statistics over samples that carry a real measurement.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct LatencyStats {
    avg_ms: f64,
    max_ms: f64,
    min_ms: f64,
}

impl LatencyStats {
    fn collect<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<Duration>>,
    {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max = f64::MIN;
        let mut min = f64::MAX;

        for ms in values.into_iter().flatten().map(|d| d.as_secs_f64() * 1000.0) {
            count += 1;
            sum += ms;
            max = max.max(ms);
            min = min.min(ms);
        }

        if count == 0 {
            return Self::default();
        }

        Self {
            avg_ms: sum / count as f64,
            max_ms: max,
            min_ms: min,
        }
    }
}
