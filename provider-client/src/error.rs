use thiserror::Error;

/// Errors reported by capability providers.
///
/// The taxonomy matters more than the individual messages: callers only
/// branch on whether an error is transient (worth another attempt) or
/// fatal (retrying cannot help).
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Content rejected by provider: {0}")]
    ContentRejected(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server overloaded: {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Map an HTTP status to the matching error variant.
    pub fn from_status(status: u16, message: String, retry_after: Option<u64>) -> Self {
        match status {
            401 | 403 => ProviderError::AuthFailure(message),
            422 => ProviderError::ContentRejected(message),
            429 => ProviderError::RateLimited { retry_after },
            500..=599 => ProviderError::ServerOverloaded { message },
            _ => ProviderError::ApiError {
                message,
                status_code: Some(status),
            },
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// An `ApiError` without a status code is a connection-level failure
    /// and counts as transient; one with a 4xx status does not.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. }
            | ProviderError::Timeout
            | ProviderError::ServerOverloaded { .. }
            | ProviderError::Io(_) => true,
            ProviderError::ApiError { status_code, .. } => status_code.is_none(),
            ProviderError::AuthFailure(_) | ProviderError::ContentRejected(_) => false,
        }
    }

    /// Whether retrying is pointless.
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }

    /// Provider-supplied backoff hint in seconds, if any.
    pub fn retry_after_hint(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ProviderError::from_status(401, "bad key".into(), None),
            ProviderError::AuthFailure(_)
        ));
        assert!(matches!(
            ProviderError::from_status(429, "slow down".into(), Some(7)),
            ProviderError::RateLimited {
                retry_after: Some(7)
            }
        ));
        assert!(matches!(
            ProviderError::from_status(503, "overloaded".into(), None),
            ProviderError::ServerOverloaded { .. }
        ));
        assert!(matches!(
            ProviderError::from_status(422, "unspeakable".into(), None),
            ProviderError::ContentRejected(_)
        ));
        assert!(matches!(
            ProviderError::from_status(404, "missing".into(), None),
            ProviderError::ApiError {
                status_code: Some(404),
                ..
            }
        ));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::RateLimited { retry_after: None }.is_transient());
        assert!(ProviderError::Timeout.is_transient());
        assert!(
            ProviderError::ServerOverloaded {
                message: "busy".into()
            }
            .is_transient()
        );
        // Connection-level failure, no status.
        assert!(
            ProviderError::ApiError {
                message: "connection reset".into(),
                status_code: None
            }
            .is_transient()
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ProviderError::AuthFailure("bad key".into()).is_fatal());
        assert!(ProviderError::ContentRejected("no".into()).is_fatal());
        assert!(
            ProviderError::ApiError {
                message: "bad request".into(),
                status_code: Some(400)
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_retry_after_hint() {
        let err = ProviderError::RateLimited {
            retry_after: Some(3),
        };
        assert_eq!(err.retry_after_hint(), Some(3));
        assert_eq!(ProviderError::Timeout.retry_after_hint(), None);
    }
}
