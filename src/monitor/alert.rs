//! Availability alerting with hysteresis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::Entry;

/// Current alert state of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    #[default]
    Healthy,
    Alerting,
}

/// Direction of an alert transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Down,
    Resumed,
}

/// A recorded state transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    /// Availability ratio (0-1) that triggered the transition.
    pub availability: f64,
    pub time: DateTime<Utc>,
    pub message: String,
}

impl AlertEvent {
    fn new(kind: AlertKind, target: &str, availability: f64, time: DateTime<Utc>) -> Self {
        let when = time.format("%Y-%m-%d %H:%M:%S UTC");
        let message = match kind {
            AlertKind::Down => format!(
                "Website {} is down. Availability = {:.2}, time = {}",
                target, availability, when
            ),
            AlertKind::Resumed => format!(
                "Website {}'s availability resumes. Availability = {:.2}, time = {}",
                target, availability, when
            ),
        };

        Self {
            kind,
            availability,
            time,
            message,
        }
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Healthy/alerting state machine for one target.
///
/// A transition fires only when the availability ratio crosses the
/// threshold against the current state, so a target that stays down
/// produces one "down" event rather than one per sample.
#[derive(Debug, Clone)]
pub struct AlertEngine {
    state: AlertState,
    threshold: f64,
    history: Vec<AlertEvent>,
}

impl AlertEngine {
    pub fn new(threshold: f64) -> Self {
        Self {
            state: AlertState::Healthy,
            threshold,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Every transition so far, oldest first.
    pub fn history(&self) -> &[AlertEvent] {
        &self.history
    }

    /// Evaluate the availability samples of the check window at `now`.
    ///
    /// Returns the transition event if the state changed. An empty window
    /// never changes state.
    pub fn evaluate<'a, I>(&mut self, target: &str, samples: I, now: DateTime<Utc>) -> Option<AlertEvent>
    where
        I: IntoIterator<Item = &'a Entry<bool>>,
    {
        let (up, total) = samples
            .into_iter()
            .fold((0usize, 0usize), |(up, total), e| (up + usize::from(e.value), total + 1));
        if total == 0 {
            return None;
        }

        let rate = up as f64 / total as f64;
        let kind = match self.state {
            AlertState::Healthy if rate < self.threshold => AlertKind::Down,
            AlertState::Alerting if rate >= self.threshold => AlertKind::Resumed,
            _ => return None,
        };

        let event = AlertEvent::new(kind, target, rate, now);
        match kind {
            AlertKind::Down => {
                self.state = AlertState::Alerting;
                tracing::warn!(url = %target, availability = rate, "{}", event);
            }
            AlertKind::Resumed => {
                self.state = AlertState::Healthy;
                tracing::info!(url = %target, availability = rate, "{}", event);
            }
        }

        self.history.push(event.clone());
        Some(event)
    }
}
