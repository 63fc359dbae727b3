//! Pipeline error taxonomy.

use provider_client::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can escape the `process_job` entry point.
///
/// Everything operational is absorbed into the returned `JobResult`;
/// only malformed input (rejected before any unit exists) and timeline
/// invariant violations (a bug, never an expected outcome) surface as
/// hard errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("incomplete timeline: unit {index} is missing its {missing} artifact")]
    IncompleteTimeline { index: usize, missing: &'static str },

    #[error("state persistence failed: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("job state serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Recorded cause of a unit- or job-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureCause {
    /// Retry budget exhausted on a retriable provider error
    TransientProvider(String),
    /// Provider error where retrying cannot help
    FatalProvider(String),
    /// Artifact could not be written to its job-scoped location
    Storage(String),
    /// Final assembly failed
    Assembly(String),
    /// Job stopped by caller request
    Cancelled,
}

impl FailureCause {
    /// Classify a provider error that has already exhausted its retries.
    pub fn from_provider(err: &ProviderError) -> Self {
        if err.is_transient() {
            FailureCause::TransientProvider(err.to_string())
        } else {
            FailureCause::FatalProvider(err.to_string())
        }
    }
}

/// A failed pipeline stage for one unit.
#[derive(Debug, Clone)]
pub struct UnitFailure {
    pub cause: FailureCause,
    /// True when the failure dooms the whole job (auth failures do;
    /// one rejected unit does not).
    pub job_fatal: bool,
}

impl UnitFailure {
    pub fn from_provider(err: &ProviderError) -> Self {
        Self {
            cause: FailureCause::from_provider(err),
            job_fatal: matches!(err, ProviderError::AuthFailure(_)),
        }
    }

    pub fn storage(err: &std::io::Error) -> Self {
        Self {
            cause: FailureCause::Storage(err.to_string()),
            job_fatal: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_provider_cause() {
        let err = ProviderError::RateLimited { retry_after: None };
        assert!(matches!(
            FailureCause::from_provider(&err),
            FailureCause::TransientProvider(_)
        ));
    }

    #[test]
    fn test_fatal_provider_cause() {
        let err = ProviderError::ContentRejected("nope".into());
        assert!(matches!(
            FailureCause::from_provider(&err),
            FailureCause::FatalProvider(_)
        ));
    }

    #[test]
    fn test_auth_failure_is_job_fatal() {
        let failure = UnitFailure::from_provider(&ProviderError::AuthFailure("bad key".into()));
        assert!(failure.job_fatal);
        let failure =
            UnitFailure::from_provider(&ProviderError::ContentRejected("unit only".into()));
        assert!(!failure.job_fatal);
    }

    #[test]
    fn test_cause_serialization() {
        let cause = FailureCause::TransientProvider("timeout".into());
        let json = serde_json::to_string(&cause).unwrap();
        assert!(json.contains("transient_provider"));
        let back: FailureCause = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cause);

        let json = serde_json::to_string(&FailureCause::Cancelled).unwrap();
        let back: FailureCause = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FailureCause::Cancelled);
    }
}
