//! Metrics collection using Prometheus
//!
//! Counters and gauges for gathering lifecycle, matchmake requests and
//! notification delivery, each collector on its own registry.

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the rendezvous service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    gathering_metrics: GatheringMetrics,

    request_metrics: RequestMetrics,
}

/// Gathering lifecycle metrics
#[derive(Clone)]
pub struct GatheringMetrics {
    /// Total gatherings created
    pub gatherings_created_total: IntCounter,

    /// Total gatherings deleted after their last participant left
    pub gatherings_deleted_total: IntCounter,

    /// Total successful joins
    pub participants_joined_total: IntCounter,

    /// Gatherings currently in the registry
    pub active_gatherings: IntGauge,
}

/// Request and delivery metrics
#[derive(Clone)]
pub struct RequestMetrics {
    /// Matchmake requests by search mode and outcome
    pub matchmake_requests_total: IntCounterVec,

    /// Notification deliveries by status
    pub notifications_total: IntCounterVec,

    /// Time spent handling one matchmake request
    pub matchmake_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let gathering_metrics = GatheringMetrics::new(&registry)?;
        let request_metrics = RequestMetrics::new(&registry)?;

        Ok(Self {
            registry,
            gathering_metrics,
            request_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn gathering(&self) -> &GatheringMetrics {
        &self.gathering_metrics
    }

    pub fn request(&self) -> &RequestMetrics {
        &self.request_metrics
    }

    /// Record a gathering being created
    pub fn record_gathering_created(&self) {
        self.gathering_metrics.gatherings_created_total.inc();
        self.gathering_metrics.active_gatherings.inc();
    }

    /// Record a gathering being deleted
    pub fn record_gathering_deleted(&self) {
        self.gathering_metrics.gatherings_deleted_total.inc();
        self.gathering_metrics.active_gatherings.dec();
    }

    pub fn record_participant_joined(&self) {
        self.gathering_metrics.participants_joined_total.inc();
    }

    /// Record a finished matchmake request
    pub fn record_matchmake_request(&self, mode: &str, success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "error" };

        self.request_metrics
            .matchmake_requests_total
            .with_label_values(&[mode, outcome])
            .inc();

        self.request_metrics
            .matchmake_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a notification delivery attempt
    pub fn record_notification(&self, delivered: bool) {
        let status = if delivered { "delivered" } else { "failed" };
        self.request_metrics
            .notifications_total
            .with_label_values(&[status])
            .inc();
    }
}

impl GatheringMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let gatherings_created_total = IntCounter::new(
            "rendezvous_gatherings_created_total",
            "Total gatherings created",
        )?;
        registry.register(Box::new(gatherings_created_total.clone()))?;

        let gatherings_deleted_total = IntCounter::new(
            "rendezvous_gatherings_deleted_total",
            "Total gatherings deleted",
        )?;
        registry.register(Box::new(gatherings_deleted_total.clone()))?;

        let participants_joined_total = IntCounter::new(
            "rendezvous_participants_joined_total",
            "Total participants joined to gatherings",
        )?;
        registry.register(Box::new(participants_joined_total.clone()))?;

        let active_gatherings = IntGauge::new(
            "rendezvous_active_gatherings",
            "Number of gatherings in the registry",
        )?;
        registry.register(Box::new(active_gatherings.clone()))?;

        Ok(Self {
            gatherings_created_total,
            gatherings_deleted_total,
            participants_joined_total,
            active_gatherings,
        })
    }
}

impl RequestMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matchmake_requests_total = IntCounterVec::new(
            Opts::new(
                "rendezvous_matchmake_requests_total",
                "Total matchmake requests processed",
            ),
            &["mode", "outcome"],
        )?;
        registry.register(Box::new(matchmake_requests_total.clone()))?;

        let notifications_total = IntCounterVec::new(
            Opts::new(
                "rendezvous_notifications_total",
                "Total notification deliveries attempted",
            ),
            &["status"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        let matchmake_duration = Histogram::with_opts(
            HistogramOpts::new(
                "rendezvous_matchmake_duration_seconds",
                "Time to process a matchmake request",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
        )?;
        registry.register(Box::new(matchmake_duration.clone()))?;

        Ok(Self {
            matchmake_requests_total,
            notifications_total,
            matchmake_duration,
        })
    }
}
