use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::metrics::Metrics;
use crate::utils::IsTransient;

// ============================================================================
// Circuit Breaker Pattern Implementation
// ============================================================================
//
// Guards one upstream service. After `failure_threshold` consecutive failures
// calls are rejected without touching the network until `open_timeout` has
// passed, then a trial call is let through. Only transient errors count as
// failures; a rejected request still proves the upstream is answering.
//
// States:
// - Closed: Normal operation, requests pass through
// - Open: Too many failures, requests blocked immediately
// - HalfOpen: Testing if service recovered
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// Time spent open before a trial call
    pub open_timeout: Duration,
    /// Successes in half-open needed to close again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(10),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker for {0} is open")]
    CircuitOpen(&'static str),

    #[error("{0}")]
    OperationFailed(E),
}

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    upstream: &'static str,
    inner: Arc<Mutex<BreakerState>>,
    config: CircuitBreakerConfig,
    metrics: Option<Arc<Metrics>>,
}

impl CircuitBreaker {
    pub fn new(upstream: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            upstream,
            inner: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            })),
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.update_circuit_breaker_state(self.upstream, CircuitState::Closed);
        self.metrics = Some(metrics);
        self
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitState) {
        if inner.state == to {
            return;
        }
        tracing::info!(
            upstream = self.upstream,
            from = ?inner.state,
            to = ?to,
            "Circuit breaker transition"
        );
        inner.state = to;
        inner.success_count = 0;
        if let Some(metrics) = &self.metrics {
            metrics.update_circuit_breaker_state(self.upstream, to);
        }
    }

    /// Execute an operation with circuit breaker protection
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: IsTransient,
    {
        {
            let mut inner = self.inner.lock().await;
            if inner.state == CircuitState::Open {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed < self.config.open_timeout {
                    return Err(CircuitBreakerError::CircuitOpen(self.upstream));
                }
                self.transition(&mut inner, CircuitState::HalfOpen);
            }
        }

        match operation.await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(err) if err.is_transient() => {
                self.record_failure().await;
                Err(CircuitBreakerError::OperationFailed(err))
            }
            Err(err) => {
                self.record_success().await;
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        let state = inner.state;
        match state {
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    inner.failure_count = 0;
                    inner.opened_at = None;
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Closed => inner.failure_count = 0,
            // A call admitted before another task opened the breaker
            CircuitState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.failure_count += 1;

        let state = inner.state;
        match state {
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                tracing::warn!(
                    upstream = self.upstream,
                    failures = inner.failure_count,
                    "Circuit breaker opening"
                );
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::HalfOpen => {
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, CircuitState::Open);
            }
            _ => {}
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }
}
