// Private module declaration
mod server;

use std::time::Instant;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};

use crate::utils::CircuitState;

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// One registry per process, whichever service the process runs:
// - RPC handling (count by status code, latency)
// - Outbound calls from the frontend and checkout
// - Catalog reloads and the current catalog generation
// - Circuit breaker state and retry attempts (resilient mode)
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // RPC Metrics
    pub rpc_requests_total: IntCounterVec,
    pub rpc_duration_seconds: HistogramVec,

    // Outbound Metrics
    pub upstream_calls_total: IntCounterVec,

    // Catalog Metrics
    pub catalog_reloads_total: IntCounterVec,
    pub catalog_generation: IntGauge,

    // Resilience Metrics
    pub circuit_breaker_state: IntGaugeVec,
    pub retry_attempts_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // RPC Metrics
        let rpc_requests_total = IntCounterVec::new(
            Opts::new("rpc_requests_total", "Total RPCs handled, by status code"),
            &["service", "method", "code"],
        )?;
        registry.register(Box::new(rpc_requests_total.clone()))?;

        let rpc_duration_seconds = HistogramVec::new(
            HistogramOpts::new("rpc_duration_seconds", "RPC handling duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 3.0]),
            &["service", "method"],
        )?;
        registry.register(Box::new(rpc_duration_seconds.clone()))?;

        // Outbound Metrics
        let upstream_calls_total = IntCounterVec::new(
            Opts::new("upstream_calls_total", "Outbound RPCs to other services"),
            &["upstream", "outcome"],
        )?;
        registry.register(Box::new(upstream_calls_total.clone()))?;

        // Catalog Metrics
        let catalog_reloads_total = IntCounterVec::new(
            Opts::new("catalog_reloads_total", "Catalog reload attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(catalog_reloads_total.clone()))?;

        let catalog_generation = IntGauge::new(
            "catalog_generation",
            "Generation number of the catalog snapshot being served",
        )?;
        registry.register(Box::new(catalog_generation.clone()))?;

        // Resilience Metrics
        let circuit_breaker_state = IntGaugeVec::new(
            Opts::new(
                "circuit_breaker_state",
                "Circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
            ),
            &["upstream"],
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Retried outbound calls"),
            &["upstream"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        Ok(Self {
            registry,
            rpc_requests_total,
            rpc_duration_seconds,
            upstream_calls_total,
            catalog_reloads_total,
            catalog_generation,
            circuit_breaker_state,
            retry_attempts_total,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record one handled RPC
    pub fn record_rpc(&self, service: &str, method: &str, code: tonic::Code, started: Instant) {
        let code = format!("{code:?}");
        self.rpc_requests_total
            .with_label_values(&[service, method, code.as_str()])
            .inc();
        self.rpc_duration_seconds
            .with_label_values(&[service, method])
            .observe(started.elapsed().as_secs_f64());
    }

    /// Helper to record an outbound call outcome
    pub fn record_upstream_call(&self, upstream: &str, outcome: &str) {
        self.upstream_calls_total
            .with_label_values(&[upstream, outcome])
            .inc();
    }

    /// Helper to record a catalog reload attempt
    pub fn record_catalog_reload(&self, generation: Option<u64>) {
        match generation {
            Some(generation) => {
                self.catalog_reloads_total.with_label_values(&["success"]).inc();
                self.catalog_generation.set(generation as i64);
            }
            None => {
                self.catalog_reloads_total.with_label_values(&["failure"]).inc();
            }
        }
    }

    /// Helper to update circuit breaker state
    pub fn update_circuit_breaker_state(&self, upstream: &str, state: CircuitState) {
        let value = match state {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        };
        self.circuit_breaker_state
            .with_label_values(&[upstream])
            .set(value);
    }

    /// Helper to record retry attempt
    pub fn record_retry_attempt(&self, upstream: &str) {
        self.retry_attempts_total.with_label_values(&[upstream]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(
        gathered: &'a [prometheus::proto::MetricFamily],
        name: &str,
    ) -> &'a prometheus::proto::MetricFamily {
        gathered.iter().find(|m| m.name() == name).unwrap()
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        // Gauges without labels are always gathered
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_rpc() {
        let metrics = Metrics::new().unwrap();
        let started = Instant::now();
        metrics.record_rpc("cart", "AddItem", tonic::Code::Ok, started);
        metrics.record_rpc("cart", "AddItem", tonic::Code::Ok, started);
        metrics.record_rpc("cart", "GetCart", tonic::Code::Unavailable, started);

        let gathered = metrics.registry().gather();
        let requests = find(&gathered, "rpc_requests_total");
        assert_eq!(requests.metric.len(), 2);

        let durations = find(&gathered, "rpc_duration_seconds");
        assert_eq!(durations.metric.len(), 2);
    }

    #[test]
    fn test_record_catalog_reload() {
        let metrics = Metrics::new().unwrap();
        metrics.record_catalog_reload(Some(3));
        metrics.record_catalog_reload(None);

        let gathered = metrics.registry().gather();
        let generation = find(&gathered, "catalog_generation");
        assert_eq!(generation.metric[0].gauge.value, Some(3.0));

        let reloads = find(&gathered, "catalog_reloads_total");
        assert_eq!(reloads.metric.len(), 2);
    }

    #[test]
    fn test_circuit_breaker_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.update_circuit_breaker_state("cart", CircuitState::Closed);
        metrics.update_circuit_breaker_state("cart", CircuitState::Open);
        metrics.record_retry_attempt("cart");

        let gathered = metrics.registry().gather();
        let state = find(&gathered, "circuit_breaker_state");
        assert_eq!(state.metric[0].gauge.value, Some(1.0));
    }
}
