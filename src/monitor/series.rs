//! Time-ordered sample series with bounded retention.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;

use super::MonitorError;

/// A value and the time it was observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

/// Append-only series that drops entries older than `retention` relative
/// to its newest entry.
///
/// Timestamps must be non-decreasing, so expired entries are always at the
/// head and eviction never scans past the first retained entry.
#[derive(Debug, Clone)]
pub struct RollingSeries<T> {
    entries: VecDeque<Entry<T>>,
    retention: ChronoDuration,
}

impl<T> RollingSeries<T> {
    pub fn new(retention: ChronoDuration) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
        }
    }

    /// Append a value and evict everything that fell out of retention.
    ///
    /// Returns the evicted entries, oldest first, so derived state can be
    /// reconciled.
    pub fn append(
        &mut self,
        value: T,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<Entry<T>>, MonitorError> {
        if let Some(latest) = self.latest_timestamp() {
            if timestamp < latest {
                return Err(MonitorError::OutOfOrder {
                    latest,
                    received: timestamp,
                });
            }
        }

        self.entries.push_back(Entry { value, timestamp });

        let mut evicted = Vec::new();
        if let Some(cutoff) = timestamp.checked_sub_signed(self.retention) {
            while self.entries.front().is_some_and(|e| e.timestamp < cutoff) {
                evicted.extend(self.entries.pop_front());
            }
        }

        Ok(evicted)
    }

    /// Entries no older than `duration` before the newest entry, oldest first.
    ///
    /// Computed fresh on every call.
    pub fn window(&self, duration: ChronoDuration) -> impl Iterator<Item = &Entry<T>> + '_ {
        let start = self
            .latest_timestamp()
            .and_then(|latest| latest.checked_sub_signed(duration))
            .map(|cutoff| self.entries.partition_point(|e| e.timestamp < cutoff))
            .unwrap_or(0);

        self.entries.range(start..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<T>> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.back().map(|e| e.timestamp)
    }

    pub fn oldest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.front().map(|e| e.timestamp)
    }

    /// Time between the oldest and newest retained entries.
    pub fn span(&self) -> ChronoDuration {
        match (self.oldest_timestamp(), self.latest_timestamp()) {
            (Some(oldest), Some(latest)) => latest - oldest,
            _ => ChronoDuration::zero(),
        }
    }
}
