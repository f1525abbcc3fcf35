//! uptrail - HTTP availability monitor.
//!
//! Probes endpoints on fixed intervals, keeps rolling availability, latency
//! and status-code history per target, and alerts when availability over
//! the last two minutes drops below a threshold.

pub mod config;
pub mod monitor;
pub mod probe;
pub mod report;
pub mod scheduler;
pub mod web;
