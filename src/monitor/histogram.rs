//! Status code histogram.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{Entry, MonitorError};

/// Count of samples for one status code. `code` is `None` for probes that
/// got no HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub code: Option<u16>,
    pub count: usize,
}

/// Count of samples by status code.
///
/// The aggregator keeps one of these in step with its status series: every
/// appended code is recorded and every evicted code unrecorded, so the total
/// always equals the series length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusHistogram {
    counts: BTreeMap<Option<u16>, usize>,
}

impl StatusHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, code: Option<u16>) {
        *self.counts.entry(code).or_insert(0) += 1;
    }

    /// Remove one occurrence of `code`. Codes whose count reaches zero are
    /// dropped from the map.
    pub fn unrecord(&mut self, code: Option<u16>) -> Result<(), MonitorError> {
        match self.counts.get_mut(&code) {
            Some(count) if *count > 1 => {
                *count -= 1;
                Ok(())
            }
            Some(_) => {
                self.counts.remove(&code);
                Ok(())
            }
            None => Err(MonitorError::HistogramUnderflow { code }),
        }
    }

    /// Build a histogram by counting a window of status entries directly.
    pub fn windowed_counts<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a Entry<Option<u16>>>,
    {
        let mut histogram = Self::new();
        for entry in entries {
            histogram.record(entry.value);
        }
        histogram
    }

    pub fn get(&self, code: Option<u16>) -> usize {
        self.counts.get(&code).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Counts in ascending code order, with "no response" first.
    pub fn iter(&self) -> impl Iterator<Item = StatusCount> + '_ {
        self.counts
            .iter()
            .map(|(code, count)| StatusCount { code: *code, count: *count })
    }

    pub fn to_counts(&self) -> Vec<StatusCount> {
        self.iter().collect()
    }
}
