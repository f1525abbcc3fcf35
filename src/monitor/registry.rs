//! Registry of monitored targets.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{AggregatorConfig, Target, TargetAggregator};

/// Map from target URL to its aggregator.
///
/// Shared as `Arc<Registry>` between the scheduler, the reporter and the
/// web handlers. Iteration order is by URL.
#[derive(Debug, Default)]
pub struct Registry {
    config: AggregatorConfig,
    aggregators: RwLock<BTreeMap<String, Arc<TargetAggregator>>>,
}

impl Registry {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            aggregators: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Register a target, returning its aggregator.
    ///
    /// Registering a URL that is already present returns the existing
    /// aggregator and keeps its history.
    pub fn register(&self, target: Target) -> Arc<TargetAggregator> {
        let mut aggregators = self.aggregators.write();
        aggregators
            .entry(target.url().to_string())
            .or_insert_with(|| {
                tracing::debug!("Registry: Registering {}", target.url());
                Arc::new(TargetAggregator::new(target, self.config))
            })
            .clone()
    }

    pub fn get(&self, url: &str) -> Option<Arc<TargetAggregator>> {
        self.aggregators.read().get(url).cloned()
    }

    pub fn remove(&self, url: &str) -> Option<Arc<TargetAggregator>> {
        self.aggregators.write().remove(url)
    }

    pub fn aggregators(&self) -> Vec<Arc<TargetAggregator>> {
        self.aggregators.read().values().cloned().collect()
    }

    pub fn targets(&self) -> Vec<Target> {
        self.aggregators
            .read()
            .values()
            .map(|a| a.target().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.aggregators.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregators.read().is_empty()
    }
}
