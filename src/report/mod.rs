//! Plain-text rendering of metrics snapshots.

use std::fmt::Write;

use crate::monitor::MetricsSnapshot;

const REPORT_RULE: &str =
    "############################################################################";
const TARGET_RULE: &str =
    "----------------------------------------------------------------------------";

/// Render a full report: a header for the window, then each target.
pub fn render_report(window_minutes: i64, snapshots: &[MetricsSnapshot]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", REPORT_RULE);
    let _ = writeln!(out, "Metrics for last {} minutes.", window_minutes);

    if snapshots.is_empty() {
        let _ = writeln!(out, "No targets.");
    }

    for snapshot in snapshots {
        out.push_str(&render_snapshot(snapshot));
    }

    out
}

/// Render one target's metrics.
pub fn render_snapshot(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TARGET_RULE);
    let _ = writeln!(
        out,
        "url: {}. Check interval: {} ms",
        snapshot.target, snapshot.interval_ms
    );
    let _ = writeln!(out, "Availability rate: {:.2}%", snapshot.availability);
    let _ = writeln!(out, "Avg response time: {:.2} ms", snapshot.avg_latency_ms);
    let _ = writeln!(out, "Max response time: {:.2} ms", snapshot.max_latency_ms);
    let _ = writeln!(out, "Min response time: {:.2} ms", snapshot.min_latency_ms);

    for status in &snapshot.status_counts {
        match status.code {
            Some(code) => {
                let _ = writeln!(out, "Response code {} count: {}", code, status.count);
            }
            None => {
                let _ = writeln!(out, "No response count: {}", status.count);
            }
        }
    }

    if snapshot.alerts.is_empty() {
        let _ = writeln!(out, "Down and resume history: None.");
    } else {
        let _ = writeln!(out, "Down and resume history:");
        for event in &snapshot.alerts {
            let _ = writeln!(out, "{}", event);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{AggregatorConfig, Sample, Target, TargetAggregator, TraceWindow};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn aggregator() -> TargetAggregator {
        let target = Target::new("www.google.com", Duration::from_millis(800)).unwrap();
        TargetAggregator::new(target, AggregatorConfig::default())
    }

    #[test]
    fn test_render_empty_snapshot() {
        let snapshot = aggregator().snapshot(TraceWindow::Short);

        let expected = format!(
            "{}\n\
             url: http://www.google.com/. Check interval: 800 ms\n\
             Availability rate: 0.00%\n\
             Avg response time: 0.00 ms\n\
             Max response time: 0.00 ms\n\
             Min response time: 0.00 ms\n\
             Down and resume history: None.\n",
            TARGET_RULE
        );
        assert_eq!(render_snapshot(&snapshot), expected);
    }

    #[test]
    fn test_render_statuses_and_history() {
        let agg = aggregator();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for i in 0..13 {
            let ts = base + ChronoDuration::seconds(i * 10);
            let sample = if i == 0 {
                Sample::up(ts, Duration::from_millis(120), 200)
            } else {
                Sample::down(ts, None)
            };
            agg.ingest(sample).unwrap();
        }

        let text = render_snapshot(&agg.snapshot(TraceWindow::Short));
        assert!(text.contains("Response code 200 count: 1\n"));
        assert!(text.contains("No response count: 12\n"));
        assert!(text.contains("Avg response time: 120.00 ms\n"));
        assert!(text.contains("Down and resume history:\nWebsite http://www.google.com/ is down."));
    }

    #[test]
    fn test_render_report_header() {
        let report = render_report(60, &[]);
        assert!(report.starts_with(REPORT_RULE));
        assert!(report.contains("Metrics for last 60 minutes.\n"));
        assert!(report.ends_with("No targets.\n"));
    }
}
