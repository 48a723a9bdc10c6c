//! Prometheus metrics collection for devil-router
//!
//! Tracks:
//! - routed requests by resolved category and mode
//! - fallbacks by kind
//! - hard failures where no credential could be resolved
//! - routing latency by mode
//!
//! Exposed at `/metrics` in Prometheus text format.

use crate::router::{Fallback, RouteMode};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector shared by all handlers
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    routes_total: IntCounterVec,
    route_fallbacks: IntCounterVec,
    credential_missing: IntCounter,
    routing_duration: HistogramVec,
}

impl Metrics {
    /// Register all metrics with a fresh registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Category label values come from the routing table, so cardinality
        // is bounded by configuration: categories × 2 modes.
        let routes_total = IntCounterVec::new(
            Opts::new(
                "devil_router_routes_total",
                "Successful routing decisions by resolved category and mode",
            ),
            &["category", "mode"],
        )?;

        let route_fallbacks = IntCounterVec::new(
            Opts::new(
                "devil_router_route_fallbacks_total",
                "Routing decisions that substituted the default category, by kind",
            ),
            &["kind"],
        )?;

        let credential_missing = IntCounter::with_opts(Opts::new(
            "devil_router_credential_missing_total",
            "Routing requests that failed because neither the requested nor the \
            default credential is configured",
        ))?;

        let routing_duration = HistogramVec::new(
            HistogramOpts::new(
                "devil_router_routing_duration_ms",
                "Routing decision latency in milliseconds, including credential lookup",
            )
            .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0]),
            &["mode"],
        )?;

        registry.register(Box::new(routes_total.clone()))?;
        registry.register(Box::new(route_fallbacks.clone()))?;
        registry.register(Box::new(credential_missing.clone()))?;
        registry.register(Box::new(routing_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            routes_total,
            route_fallbacks,
            credential_missing,
            routing_duration,
        })
    }

    /// Record a successful routing decision
    ///
    /// # Errors
    ///
    /// Returns an error if the label set does not match the metric.
    pub fn record_route(
        &self,
        category: &str,
        mode: RouteMode,
        fallback: Option<Fallback>,
    ) -> Result<(), prometheus::Error> {
        self.routes_total
            .get_metric_with_label_values(&[category, mode.as_str()])?
            .inc();
        if let Some(kind) = fallback {
            self.route_fallbacks
                .get_metric_with_label_values(&[kind.as_str()])?
                .inc();
        }
        Ok(())
    }

    pub fn credential_missing(&self) {
        self.credential_missing.inc();
    }

    pub fn credential_missing_count(&self) -> u64 {
        self.credential_missing.get()
    }

    /// Record routing latency
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite or negative; such
    /// values would poison every histogram percentile.
    pub fn record_routing_duration(
        &self,
        mode: RouteMode,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "routing duration must be finite and non-negative, got: {}",
                duration_ms
            )));
        }
        self.routing_duration
            .get_metric_with_label_values(&[mode.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Encode all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        tracing::debug!(
            metric_family_count = metric_families.len(),
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("metrics output is not valid UTF-8: {}", e))
        })
    }
}
