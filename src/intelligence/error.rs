//! Error type for the intelligence service client.
//!
//! Every variant is recoverable: callers report it and keep their previous
//! state. [`IntelligenceError::is_retryable`] separates transient transport
//! failures from answers that will not improve on a retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntelligenceError {
    /// HTTP 429. `retry_after_ms` comes from the `retry-after` header when present.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-success HTTP status.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// DNS, connect, TLS or timeout failure.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The service answered but produced no text.
    #[error("empty response from intelligence service")]
    EmptyResponse,

    /// The service answered with text that does not match the expected shape.
    #[error("malformed {what} response: {detail}")]
    Malformed { what: &'static str, detail: String },

    /// The request was not sent because its input was unusable.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl IntelligenceError {
    pub fn malformed(what: &'static str, detail: impl ToString) -> Self {
        Self::Malformed {
            what,
            detail: detail.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            IntelligenceError::RateLimited { .. } | IntelligenceError::NetworkError(_) => true,
            IntelligenceError::ApiError { status, .. } => *status >= 500,
            IntelligenceError::EmptyResponse
            | IntelligenceError::Malformed { .. }
            | IntelligenceError::InvalidRequest(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display() {
        let err = IntelligenceError::RateLimited {
            retry_after_ms: 5000,
        };
        assert_eq!(err.to_string(), "rate limited, retry after 5000ms");
    }

    #[test]
    fn malformed_display() {
        let err = IntelligenceError::malformed("dispatch plan", "expected value at line 1 column 1");
        assert_eq!(
            err.to_string(),
            "malformed dispatch plan response: expected value at line 1 column 1"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(IntelligenceError::RateLimited { retry_after_ms: 1 }.is_retryable());
        assert!(
            IntelligenceError::ApiError {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !IntelligenceError::ApiError {
                status: 401,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!IntelligenceError::EmptyResponse.is_retryable());
        assert!(!IntelligenceError::malformed("x", "y").is_retryable());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IntelligenceError>();
    }
}
