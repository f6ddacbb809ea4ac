//! Scorer Adapter Port
//!
//! Each analytical specialty is reached through the [`ScorerAdapter`]
//! capability. The engine only sees this trait, so the backend behind it can
//! be a remote reasoning service, a rule engine, or a test double.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_scoring::{ScorerAdapter, ScoreAssessment, ScorerError};
//!
//! struct RemoteScorer { /* client */ }
//!
//! #[async_trait]
//! impl ScorerAdapter for RemoteScorer {
//!     fn id(&self) -> &str { "network" }
//!     fn version(&self) -> &str { "2.1" }
//!     async fn evaluate(&self, claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
//!         // call the reasoning service, parse {score, rationale}
//!     }
//! }
//! ```
//!
//! Timeouts are applied by the caller, not the adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use domain_claims::Claim;
use crate::error::ScorerError;

/// What a scorer says about a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAssessment {
    /// Risk value, expected within [0, 1]
    pub score: f64,
    /// Audit text explaining the value
    pub rationale: String,
}

impl ScoreAssessment {
    pub fn new(score: f64, rationale: impl Into<String>) -> Self {
        Self {
            score,
            rationale: rationale.into(),
        }
    }
}

/// Uniform contract for one risk-assessment capability
///
/// Implementations must never mutate the claim and should treat every call
/// as independent; the engine may run many in parallel.
#[async_trait]
pub trait ScorerAdapter: Send + Sync + 'static {
    /// Stable identifier, unique within a pipeline
    fn id(&self) -> &str;

    /// Version reported alongside every result
    fn version(&self) -> &str;

    /// Scores one claim
    async fn evaluate(&self, claim: &Claim) -> Result<ScoreAssessment, ScorerError>;
}
