//! Observability for the squeeze server

pub mod metrics;

pub use metrics::{MetricsSnapshot, ServerMetrics};
