use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tonic::transport::{Channel, Endpoint};

use crate::domain::ServiceError;
use crate::metrics::Metrics;
use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, RetryConfig,
};

mod services;

pub use services::{
    AdClient, CartClient, CatalogClient, CheckoutClient, CurrencyClient, EmailClient,
    PaymentClient, PlaceOrder, RecommendationClient, ShippingClient,
};

// ============================================================================
// Outbound gRPC Clients
// ============================================================================
//
// Every downstream service is reached through an `Upstream`: a lazily
// connected channel plus, in resilient mode, a circuit breaker wrapped around
// a transient-error retry loop.
//
// Without resilience a failed call surfaces immediately as
// `ServiceError::UpstreamUnavailable` carrying the upstream status.
//
// ============================================================================

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
struct Resilience {
    breaker: CircuitBreaker,
    retry: RetryConfig,
}

#[derive(Clone)]
pub struct Upstream {
    name: &'static str,
    channel: Channel,
    resilience: Option<Resilience>,
    metrics: Option<Arc<Metrics>>,
}

impl Upstream {
    /// Build a channel that connects on first use. `addr` may omit the scheme.
    pub fn connect_lazy(name: &'static str, addr: &str) -> anyhow::Result<Self> {
        let uri = if addr.contains("://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        };

        let endpoint = Endpoint::from_shared(uri)
            .with_context(|| format!("invalid {name} address: {addr}"))?
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT);

        tracing::debug!(upstream = name, addr, "Upstream channel configured");

        Ok(Self::from_channel(name, endpoint.connect_lazy()))
    }

    pub fn from_channel(name: &'static str, channel: Channel) -> Self {
        Self {
            name,
            channel,
            resilience: None,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        if let Some(resilience) = self.resilience.take() {
            self.resilience = Some(Resilience {
                breaker: resilience.breaker.with_metrics(metrics.clone()),
                retry: resilience.retry,
            });
        }
        self.metrics = Some(metrics);
        self
    }

    pub fn with_resilience(mut self, breaker: CircuitBreakerConfig, retry: RetryConfig) -> Self {
        let mut circuit = CircuitBreaker::new(self.name, breaker);
        if let Some(metrics) = &self.metrics {
            circuit = circuit.with_metrics(metrics.clone());
        }
        self.resilience = Some(Resilience {
            breaker: circuit,
            retry,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    pub fn breaker(&self) -> Option<CircuitBreaker> {
        self.resilience.as_ref().map(|r| r.breaker.clone())
    }

    /// Run an idempotent RPC. `op` builds a fresh request future per attempt.
    pub async fn call<T, F, Fut>(&self, mut op: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, tonic::Status>>,
    {
        let result = match &self.resilience {
            None => op().await,
            Some(resilience) => {
                let metrics = self.metrics.clone();
                let name = self.name;
                let retried = retry_on_transient(
                    &resilience.retry,
                    |_attempt| op(),
                    |_attempt| {
                        if let Some(metrics) = &metrics {
                            metrics.record_retry_attempt(name);
                        }
                    },
                );
                guarded(&resilience.breaker, retried).await
            }
        };

        self.finish(result)
    }

    /// Run an RPC that must not be repeated, such as a charge or an append.
    /// The breaker still applies, retries do not.
    pub async fn call_once<T, Fut>(&self, op: Fut) -> Result<T, ServiceError>
    where
        Fut: Future<Output = Result<T, tonic::Status>>,
    {
        let result = match &self.resilience {
            None => op.await,
            Some(resilience) => guarded(&resilience.breaker, op).await,
        };

        self.finish(result)
    }

    fn finish<T>(&self, result: Result<T, tonic::Status>) -> Result<T, ServiceError> {
        match result {
            Ok(value) => {
                self.record("success");
                Ok(value)
            }
            Err(status) => {
                tracing::warn!(
                    upstream = self.name,
                    code = ?status.code(),
                    message = status.message(),
                    "Upstream call failed"
                );
                self.record("failure");
                Err(ServiceError::upstream(self.name, status))
            }
        }
    }

    fn record(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_upstream_call(self.name, outcome);
        }
    }
}

async fn guarded<T, Fut>(breaker: &CircuitBreaker, op: Fut) -> Result<T, tonic::Status>
where
    Fut: Future<Output = Result<T, tonic::Status>>,
{
    breaker.call(op).await.map_err(|err| match err {
        CircuitBreakerError::CircuitOpen(upstream) => {
            tonic::Status::unavailable(format!("circuit breaker for {upstream} is open"))
        }
        CircuitBreakerError::OperationFailed(status) => status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unreachable_upstream() -> Upstream {
        Upstream::connect_lazy("cart", "127.0.0.1:1").unwrap()
    }

    #[tokio::test]
    async fn test_plain_call_fails_fast_with_upstream_status() {
        let upstream = unreachable_upstream();
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = upstream
            .call(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(tonic::Status::unavailable("connection refused")) }
            })
            .await;

        match result {
            Err(ServiceError::UpstreamUnavailable { service, status }) => {
                assert_eq!(service, "cart");
                assert_eq!(status.code(), tonic::Code::Unavailable);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resilient_call_retries_then_opens_breaker() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let upstream = unreachable_upstream()
            .with_resilience(
                CircuitBreakerConfig {
                    failure_threshold: 1,
                    open_timeout: Duration::from_secs(60),
                    success_threshold: 1,
                },
                RetryConfig {
                    max_attempts: 3,
                    initial_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(2),
                    multiplier: 2.0,
                },
            )
            .with_metrics(metrics.clone());
        let attempts = AtomicU32::new(0);

        let first: Result<(), _> = upstream
            .call(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(tonic::Status::unavailable("down")) }
            })
            .await;
        assert!(first.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.retry_attempts_total.with_label_values(&["cart"]).get(), 2);

        // Breaker is open now; the operation is not attempted
        let second: Result<(), _> = upstream
            .call(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;
        assert!(second.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(
            metrics.upstream_calls_total.with_label_values(&["cart", "failure"]).get(),
            2
        );
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        assert!(Upstream::connect_lazy("cart", "http://exa mple:80").is_err());
    }

    fn resilient_upstream() -> Upstream {
        unreachable_upstream().with_resilience(
            CircuitBreakerConfig::default(),
            RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(2),
                multiplier: 2.0,
            },
        )
    }

    #[tokio::test]
    async fn test_call_once_never_repeats_a_write() {
        let upstream = resilient_upstream();
        let writes = AtomicU32::new(0);

        let result: Result<(), _> = upstream
            .call_once(async {
                writes.fetch_add(1, Ordering::SeqCst);
                Err(tonic::Status::deadline_exceeded("applied, but the reply was late"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_declined_requests_keep_upstream_available() {
        let upstream = resilient_upstream();
        for _ in 0..CircuitBreakerConfig::default().failure_threshold {
            let declined: Result<(), _> = upstream
                .call_once(async { Err(tonic::Status::invalid_argument("card declined")) })
                .await;
            match declined {
                Err(ServiceError::UpstreamUnavailable { status, .. }) => {
                    assert_eq!(status.code(), tonic::Code::InvalidArgument)
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }

        let ran = AtomicU32::new(0);
        let next = upstream
            .call(|| {
                ran.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;
        assert!(next.is_ok());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
