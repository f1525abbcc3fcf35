//! Per-target metrics aggregation and alerting.
//!
//! Probe samples flow into a [`TargetAggregator`], which keeps bounded
//! rolling history for each metric dimension and answers windowed
//! [`MetricsSnapshot`] queries. The [`Registry`] maps target URLs to their
//! aggregators.

mod aggregator;
mod alert;
mod histogram;
mod models;
mod registry;
mod series;

pub use aggregator::*;
pub use alert::*;
pub use histogram::*;
pub use models::*;
pub use registry::*;
pub use series::*;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Monitor error types.
///
/// `OutOfOrder` and `HistogramUnderflow` mean the single-writer,
/// monotonic-time assumption was broken. Callers must not ignore them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("sample at {received} is older than the latest entry at {latest}")]
    OutOfOrder {
        latest: DateTime<Utc>,
        received: DateTime<Utc>,
    },
    #[error("status histogram underflow for code {code:?}")]
    HistogramUnderflow { code: Option<u16> },
    #[error("invalid target {address:?}: {reason}")]
    InvalidTarget { address: String, reason: String },
}
