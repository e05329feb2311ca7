use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Exponential Backoff Retry Strategy
// ============================================================================
//
// Retries an operation only while its error is transient, doubling the delay
// between attempts up to `max_delay`.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

/// Check if an error is transient (should retry) or permanent (should not retry)
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

impl IsTransient for tonic::Status {
    fn is_transient(&self) -> bool {
        matches!(
            self.code(),
            tonic::Code::Unavailable | tonic::Code::DeadlineExceeded | tonic::Code::ResourceExhausted
        )
    }
}

/// Retry with transient error checking. `on_retry` runs before each retry
/// with the attempt number that just failed.
pub async fn retry_on_transient<F, Fut, T, E, R>(
    config: &RetryConfig,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
    R: FnMut(u32),
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) if !error.is_transient() => {
                tracing::debug!(error = %error, "Permanent failure, not retrying");
                return Err(error);
            }
            Err(error) if attempt >= config.max_attempts => {
                tracing::error!(
                    attempt,
                    error = %error,
                    "Operation failed after all retries"
                );
                return Err(error);
            }
            Err(error) => {
                tracing::warn!(
                    attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying after delay"
                );
                on_retry(attempt);

                sleep(delay).await;
                delay = delay.mul_f64(config.multiplier).min(config.max_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_eventually() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut retries = 0;

        let result = retry_on_transient(
            &fast(),
            |_attempt| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(tonic::Status::unavailable("down"))
                    } else {
                        Ok("success")
                    }
                }
            },
            |_| retries += 1,
        )
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(retries, 2);
    }

    #[tokio::test]
    async fn test_retry_fails_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let result: Result<(), _> = retry_on_transient(
            &fast(),
            |_attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(tonic::Status::deadline_exceeded("slow")) }
            },
            |_| {},
        )
        .await;

        assert_eq!(result.unwrap_err().code(), tonic::Code::DeadlineExceeded);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let counter = AtomicU32::new(0);
        let result: Result<(), _> = retry_on_transient(
            &fast(),
            |_attempt| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(tonic::Status::not_found("no product")) }
            },
            |_| {},
        )
        .await;

        assert_eq!(result.unwrap_err().code(), tonic::Code::NotFound);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
