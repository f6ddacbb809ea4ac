//! Scoring domain errors

use thiserror::Error;

use domain_claims::ScoreFailure;

/// Ways a scorer adapter call can fail
///
/// None of these abort a claim: the pipeline records each as a sentinel
/// [`domain_claims::ScoreResult`].
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Scorer {scorer} timed out after {timeout_ms}ms")]
    Timeout { scorer: String, timeout_ms: u64 },

    #[error("Upstream reasoning call failed for {scorer}: {message}")]
    UpstreamError { scorer: String, message: String },

    #[error("Claim is missing {field} required by {scorer}")]
    InvalidInput { scorer: String, field: String },
}

impl ScorerError {
    pub fn upstream(scorer: impl Into<String>, message: impl Into<String>) -> Self {
        ScorerError::UpstreamError {
            scorer: scorer.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input(scorer: impl Into<String>, field: impl Into<String>) -> Self {
        ScorerError::InvalidInput {
            scorer: scorer.into(),
            field: field.into(),
        }
    }

    /// Sentinel category recorded for this failure
    pub fn failure(&self) -> ScoreFailure {
        match self {
            ScorerError::Timeout { .. } => ScoreFailure::Timeout,
            ScorerError::UpstreamError { .. } => ScoreFailure::UpstreamError,
            ScorerError::InvalidInput { .. } => ScoreFailure::InvalidInput,
        }
    }
}
