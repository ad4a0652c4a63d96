//! End-of-run performance analytics.

pub mod metrics;

pub use metrics::PerformanceMetrics;
