//! Metrics for the rendezvous service
//!
//! Prometheus collectors recorded by the gathering manager.

pub mod collector;

pub use collector::{GatheringMetrics, MetricsCollector, RequestMetrics};
