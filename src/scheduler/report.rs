//! Report manager for printing metrics on fixed timers.

use crate::monitor::{Registry, TraceWindow};
use crate::report::render_report;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// How often the short report is printed.
pub const SHORT_REPORT_PERIOD: Duration = Duration::from_secs(10);
/// How often the long report is printed. Offset so it does not land on the
/// same tick as a short report.
pub const LONG_REPORT_PERIOD: Duration = Duration::from_millis(60_100);

/// Print period for a window's report.
pub fn report_period(window: TraceWindow) -> Duration {
    match window {
        TraceWindow::Short => SHORT_REPORT_PERIOD,
        TraceWindow::Long => LONG_REPORT_PERIOD,
    }
}

/// Build the report text for every registered target.
pub fn build_report(registry: &Registry, window: TraceWindow) -> String {
    let snapshots: Vec<_> = registry
        .aggregators()
        .iter()
        .map(|a| a.snapshot(window))
        .collect();

    render_report(registry.config().window(window).num_minutes(), &snapshots)
}

/// Manager for the short and long report timers.
pub struct ReportManager {
    registry: Arc<Registry>,
    stop: broadcast::Sender<()>,
}

impl ReportManager {
    pub fn new(registry: Arc<Registry>) -> Self {
        let (stop, _) = broadcast::channel(1);
        Self { registry, stop }
    }

    /// Start the report background tasks.
    pub fn start(&self) {
        for window in [TraceWindow::Short, TraceWindow::Long] {
            let registry = self.registry.clone();
            let mut stop_rx = self.stop.subscribe();
            let period = report_period(window);

            tokio::spawn(async move {
                // First report after one full period
                let mut interval = interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = stop_rx.recv() => break,
                        _ = interval.tick() => {
                            print_report(&registry, window);
                        }
                    }
                }
            });
        }
    }

    /// Stop the report tasks.
    pub fn stop(&self) {
        let _ = self.stop.send(());
    }
}

fn print_report(registry: &Registry, window: TraceWindow) {
    let text = build_report(registry, window);

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        tracing::error!("ReportManager: Failed to write {} report: {}", window.as_str(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{AggregatorConfig, Sample, Target};
    use chrono::Utc;

    #[test]
    fn test_report_periods() {
        assert_eq!(report_period(TraceWindow::Short), Duration::from_secs(10));
        assert!(report_period(TraceWindow::Long) > Duration::from_secs(60));
    }

    #[test]
    fn test_build_report_covers_all_targets() {
        let registry = Registry::new(AggregatorConfig::default());
        let google = registry.register(Target::new("www.google.com", Duration::from_millis(800)).unwrap());
        registry.register(Target::new("github.com", Duration::from_millis(1000)).unwrap());
        google
            .ingest(Sample::up(Utc::now(), Duration::from_millis(30), 200))
            .unwrap();

        let report = build_report(&registry, TraceWindow::Short);
        assert!(report.contains("Metrics for last 10 minutes.\n"));
        assert!(report.contains("url: http://github.com/. Check interval: 1000 ms"));
        assert!(report.contains("url: http://www.google.com/. Check interval: 800 ms"));
        assert!(report.contains("Response code 200 count: 1"));
        // Sorted by URL
        assert!(report.find("github.com").unwrap() < report.find("www.google.com").unwrap());
    }

    #[test]
    fn test_stop_ends_report_tasks() {
        tokio_test::block_on(async {
            let registry = Arc::new(Registry::new(AggregatorConfig::default()));
            let manager = ReportManager::new(registry);
            manager.start();
            assert_eq!(manager.stop.receiver_count(), 2);

            manager.stop();
            for _ in 0..10 {
                if manager.stop.receiver_count() == 0 {
                    break;
                }
                tokio::task::yield_now().await;
            }
            assert_eq!(manager.stop.receiver_count(), 0);
        });
    }
}
