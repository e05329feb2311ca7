pub mod circuit_breaker;
pub mod html;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
pub use html::escape_html;
pub use retry::{retry_on_transient, IsTransient, RetryConfig};
