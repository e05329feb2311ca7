use super::money::MoneyError;

// ============================================================================
// Service Error Taxonomy
// ============================================================================
//
// One error type shared by every backend and the frontend. Each variant maps
// onto a gRPC status code (see `into_status`) and an HTTP status (see the
// frontend's `ResponseError` impl).
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed input, rejected before any side effect
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),

    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A downstream RPC failed
    #[error("{service} unavailable: {status}")]
    UpstreamUnavailable {
        service: &'static str,
        status: tonic::Status,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(service: &'static str, status: tonic::Status) -> Self {
        Self::UpstreamUnavailable { service, status }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::UnsupportedCurrency(_) => "unsupported_currency",
            ServiceError::Money(MoneyError::CurrencyMismatch { .. }) => "currency_mismatch",
            ServiceError::Money(MoneyError::Overflow) => "overflow",
            ServiceError::UpstreamUnavailable { .. } => "upstream_unavailable",
            ServiceError::Storage(_) => "storage",
            ServiceError::Internal(_) => "internal",
        }
    }

    pub fn into_status(self) -> tonic::Status {
        match self {
            ServiceError::Validation(_)
            | ServiceError::UnsupportedCurrency(_)
            | ServiceError::Money(_) => tonic::Status::invalid_argument(self.to_string()),
            ServiceError::NotFound(_) => tonic::Status::not_found(self.to_string()),
            ServiceError::UpstreamUnavailable { service, status } => {
                // Keep the upstream code so callers see the original failure
                tonic::Status::new(
                    status.code(),
                    format!("{service}: {}", status.message()),
                )
            }
            ServiceError::Storage(_) => tonic::Status::unavailable(self.to_string()),
            ServiceError::Internal(_) => tonic::Status::internal(self.to_string()),
        }
    }
}

impl From<ServiceError> for tonic::Status {
    fn from(err: ServiceError) -> Self {
        err.into_status()
    }
}
