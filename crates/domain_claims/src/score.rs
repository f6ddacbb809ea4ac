//! Scorer outputs

use serde::{Deserialize, Serialize};

use crate::error::ClaimError;

/// Why a scorer produced no usable value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFailure {
    /// The scorer did not answer within its timeout
    Timeout,
    /// The remote call failed or returned unusable output
    UpstreamError,
    /// The claim lacks a field the scorer requires
    InvalidInput,
}

impl ScoreFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreFailure::Timeout => "timeout",
            ScoreFailure::UpstreamError => "upstream_error",
            ScoreFailure::InvalidInput => "invalid_input",
        }
    }
}

/// Risk value carried by a [`ScoreResult`]
///
/// `Unknown` is the sentinel for a scorer that failed; it is recorded rather
/// than dropped so the consensus engine can see how much evidence is missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreValue {
    Scored { score: f64 },
    Unknown { failure: ScoreFailure },
}

/// Output of one scorer for one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub scorer_id: String,
    pub scorer_version: String,
    #[serde(flatten)]
    pub value: ScoreValue,
    pub rationale: String,
    pub latency_ms: u64,
}

impl ScoreResult {
    /// Creates a result with a risk value, rejecting values outside [0, 1]
    pub fn scored(
        scorer_id: impl Into<String>,
        scorer_version: impl Into<String>,
        score: f64,
        rationale: impl Into<String>,
        latency_ms: u64,
    ) -> Result<Self, ClaimError> {
        let scorer_id = scorer_id.into();
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(ClaimError::ScoreOutOfRange { scorer: scorer_id, score });
        }
        Ok(Self {
            scorer_id,
            scorer_version: scorer_version.into(),
            value: ScoreValue::Scored { score },
            rationale: rationale.into(),
            latency_ms,
        })
    }

    /// Creates the sentinel result for a failed scorer
    pub fn unknown(
        scorer_id: impl Into<String>,
        scorer_version: impl Into<String>,
        failure: ScoreFailure,
        rationale: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            scorer_id: scorer_id.into(),
            scorer_version: scorer_version.into(),
            value: ScoreValue::Unknown { failure },
            rationale: rationale.into(),
            latency_ms,
        }
    }

    /// Returns the risk value, or `None` for the sentinel
    pub fn score(&self) -> Option<f64> {
        match self.value {
            ScoreValue::Scored { score } => Some(score),
            ScoreValue::Unknown { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<ScoreFailure> {
        match self.value {
            ScoreValue::Scored { .. } => None,
            ScoreValue::Unknown { failure } => Some(failure),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.value, ScoreValue::Unknown { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_rejects_out_of_range() {
        assert!(ScoreResult::scored("social", "2.1", 1.01, "", 3).is_err());
        assert!(ScoreResult::scored("social", "2.1", -0.1, "", 3).is_err());
        assert!(ScoreResult::scored("social", "2.1", f64::NAN, "", 3).is_err());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(ScoreResult::scored("a", "1", 0.0, "", 0).unwrap().score(), Some(0.0));
        assert_eq!(ScoreResult::scored("a", "1", 1.0, "", 0).unwrap().score(), Some(1.0));
    }

    #[test]
    fn test_unknown_has_no_score() {
        let result = ScoreResult::unknown("medical", "1.0", ScoreFailure::Timeout, "timed out", 30_000);
        assert!(result.is_unknown());
        assert_eq!(result.score(), None);
        assert_eq!(result.failure(), Some(ScoreFailure::Timeout));
    }
}
