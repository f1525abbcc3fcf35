//! Scheduler module for running probes and periodic reports.

mod report;

pub use report::*;

use crate::monitor::{Registry, Target, TargetAggregator};
use crate::probe::{run_probe, HttpProbe, ProbeConfig, ProbeError};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// The scheduler that runs one probe loop per target.
pub struct Scheduler {
    registry: Arc<Registry>,
    probe: Arc<HttpProbe>,
    stop_chans: Arc<RwLock<HashMap<String, broadcast::Sender<()>>>>,
}

impl Scheduler {
    /// Create a new scheduler over the given registry.
    pub fn new(registry: Arc<Registry>, probe_config: ProbeConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            registry,
            probe: Arc::new(HttpProbe::new(&probe_config)?),
            stop_chans: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Start probing every registered target.
    pub async fn start(&self) {
        let aggregators = self.registry.aggregators();

        tracing::info!("Starting scheduler with {} targets", aggregators.len());

        for aggregator in aggregators {
            self.spawn_loop(aggregator).await;
        }
    }

    /// Register a target and start probing it.
    pub async fn add_target(&self, target: Target) -> Arc<TargetAggregator> {
        let aggregator = self.registry.register(target);
        self.spawn_loop(aggregator.clone()).await;
        aggregator
    }

    /// Stop probing a target and drop its history.
    pub async fn remove_target(&self, url: &str) {
        let mut stop_chans = self.stop_chans.write().await;

        if let Some(stop_tx) = stop_chans.remove(url) {
            let _ = stop_tx.send(());
            tracing::info!("Scheduler: Removed target {}", url);
        }
        drop(stop_chans);

        self.registry.remove(url);
    }

    /// Stop every probe loop. Histories stay in the registry.
    pub async fn stop(&self) {
        let mut stop_chans = self.stop_chans.write().await;
        for (_, stop_tx) in stop_chans.drain() {
            let _ = stop_tx.send(());
        }
    }

    pub async fn is_running(&self, url: &str) -> bool {
        self.stop_chans.read().await.contains_key(url)
    }

    async fn spawn_loop(&self, aggregator: Arc<TargetAggregator>) {
        let url = aggregator.target().url().to_string();
        let mut stop_chans = self.stop_chans.write().await;

        if stop_chans.contains_key(&url) {
            return; // Already running
        }

        let (stop_tx, stop_rx) = broadcast::channel(1);
        stop_chans.insert(url.clone(), stop_tx);
        drop(stop_chans);

        tracing::info!(
            "Scheduler: Adding target {} every {:?}",
            url,
            aggregator.target().interval()
        );

        let probe = self.probe.clone();
        let stop_chans = self.stop_chans.clone();

        tokio::spawn(async move {
            run_probe_loop(aggregator, probe, stop_rx).await;

            // Clean up when done
            let mut chans = stop_chans.write().await;
            if chans.get(&url).is_some_and(|tx| tx.receiver_count() == 0) {
                chans.remove(&url);
            }
        });
    }
}

/// Probe one target on its interval until stopped.
///
/// Each probe completes before the next starts, so samples reach the
/// aggregator in timestamp order.
async fn run_probe_loop(
    aggregator: Arc<TargetAggregator>,
    probe: Arc<HttpProbe>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let target = aggregator.target().clone();

    let mut interval = tokio::time::interval(target.interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                let sample = run_probe(&probe, &target).await;

                if let Err(e) = aggregator.ingest(sample) {
                    tracing::error!("Dropping sample for {}: {}", target.url(), e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::AggregatorConfig;
    use std::time::Duration;

    fn scheduler() -> Scheduler {
        let registry = Arc::new(Registry::new(AggregatorConfig::default()));
        let probe_config = ProbeConfig {
            connect_timeout: Duration::from_millis(100),
            request_timeout: Duration::from_millis(200),
        };
        Scheduler::new(registry, probe_config).unwrap()
    }

    #[tokio::test]
    async fn test_add_and_remove_target() {
        let scheduler = scheduler();
        let target = Target::new("127.0.0.1:1", Duration::from_millis(50)).unwrap();
        let url = target.url().to_string();

        scheduler.add_target(target.clone()).await;
        assert!(scheduler.is_running(&url).await);
        assert!(scheduler.registry.get(&url).is_some());

        // Adding again does not start a second loop
        scheduler.add_target(target).await;
        assert_eq!(scheduler.stop_chans.read().await.len(), 1);

        scheduler.remove_target(&url).await;
        assert!(!scheduler.is_running(&url).await);
        assert!(scheduler.registry.get(&url).is_none());
    }

    #[tokio::test]
    async fn test_probe_loop_ingests_samples() {
        let scheduler = scheduler();
        let target = Target::new("127.0.0.1:1", Duration::from_millis(50)).unwrap();
        let url = target.url().to_string();

        scheduler.registry.register(target);
        scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        scheduler.stop().await;

        let aggregator = scheduler.registry.get(&url).unwrap();
        assert!(aggregator.sample_count() > 0);
        assert!(!scheduler.is_running(&url).await);
    }
}
