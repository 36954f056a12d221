//! External service integrations
//!
//! Outbound calls the timer makes to other systems. Currently only the
//! page-visit metrics beacon.

pub mod metrics;

// Re-export main types
pub use metrics::{Metric, MetricBatch, MetricType, MetricsClient};
