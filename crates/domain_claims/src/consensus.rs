//! Consensus decision engine
//!
//! Turns the set of [`ScoreResult`]s for one claim into a [`Decision`]. The
//! engine is a pure function of its inputs: a reviewer holding the same
//! score results and thresholds recomputes the same decision, byte for byte.
//!
//! # Algorithm
//!
//! ```text
//! scores      = known values, in scorer order
//! confidence  = mean(scores)                      (0 when empty)
//! high_risk   = |{ s in scores : s >= fraud_threshold }|
//! insufficient = 2 * unknown > configured scorers
//!
//! REJECT    if high_risk >= consensus_threshold and confidence >= fraud_threshold
//! ESCALATE  if high_risk >= 1, or insufficient
//! APPROVE   otherwise
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{ClaimId, CoreError};
use crate::decision::{Decision, DecisionLabel};
use crate::score::ScoreResult;

/// Risk factor recorded when no scorer produced a usable value
pub const INSUFFICIENT_DATA_FACTOR: &str = "insufficient analysis data";

/// Thresholds that tune the engine's sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum score considered high risk
    pub fraud_threshold: f64,
    /// Minimum number of high-risk scores required to reject
    pub consensus_threshold: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            fraud_threshold: 0.7,
            consensus_threshold: 3,
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.fraud_threshold.is_finite() || !(0.0..=1.0).contains(&self.fraud_threshold) {
            return Err(CoreError::configuration(format!(
                "fraud_threshold must be within [0, 1], got {}",
                self.fraud_threshold
            )));
        }
        if self.consensus_threshold == 0 {
            return Err(CoreError::configuration("consensus_threshold must be at least 1"));
        }
        Ok(())
    }
}

/// Counts derived from a result set, before labelling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusTally {
    pub configured: usize,
    pub scored: usize,
    pub unknown: usize,
    pub high_risk: usize,
    pub mean: f64,
}

impl ConsensusTally {
    /// More than half of the configured scorers gave no value
    pub fn insufficient(&self) -> bool {
        self.scored == 0 || self.unknown * 2 > self.configured
    }
}

/// Deterministic aggregation of scorer outputs
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    config: ConsensusConfig,
}

impl ConsensusEngine {
    pub fn new(config: ConsensusConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Counts scored, unknown and high-risk results
    ///
    /// `configured` is the size of the scorer set the claim was run against;
    /// it is raised to the number of results if a caller passes fewer.
    pub fn tally(&self, results: &[ScoreResult], configured: usize) -> ConsensusTally {
        let scores: Vec<f64> = results.iter().filter_map(ScoreResult::score).collect();
        let mean = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        ConsensusTally {
            configured: configured.max(results.len()),
            scored: scores.len(),
            unknown: results.len() - scores.len(),
            high_risk: scores.iter().filter(|s| **s >= self.config.fraud_threshold).count(),
            mean,
        }
    }

    /// Labels a tally
    pub fn label(&self, tally: &ConsensusTally) -> DecisionLabel {
        if tally.high_risk >= self.config.consensus_threshold
            && tally.mean >= self.config.fraud_threshold
        {
            DecisionLabel::Reject
        } else if tally.high_risk >= 1 || tally.insufficient() {
            DecisionLabel::Escalate
        } else {
            DecisionLabel::Approve
        }
    }

    /// Produces the decision for one claim
    ///
    /// `results` must be in scorer submission order; risk factors follow that
    /// order, never score magnitude.
    pub fn decide(
        &self,
        claim_id: &ClaimId,
        results: &[ScoreResult],
        configured: usize,
        processing_time: Duration,
    ) -> Decision {
        let tally = self.tally(results, configured);
        let label = self.label(&tally);

        let mut risk_factors = Vec::new();
        if tally.scored == 0 {
            risk_factors.push(INSUFFICIENT_DATA_FACTOR.to_string());
        } else {
            for result in results {
                if let Some(score) = result.score() {
                    if score >= self.config.fraud_threshold {
                        risk_factors.push(high_risk_factor(result, score));
                    }
                }
            }
            if tally.insufficient() {
                risk_factors.push(format!(
                    "{}: {} of {} scorers unavailable",
                    INSUFFICIENT_DATA_FACTOR, tally.unknown, tally.configured
                ));
            }
        }

        let mut scores = BTreeMap::new();
        for result in results {
            scores
                .entry(result.scorer_id.clone())
                .or_insert_with(|| result.clone());
        }

        debug!(
            claim_id = %claim_id,
            label = %label,
            confidence = tally.mean,
            high_risk = tally.high_risk,
            unknown = tally.unknown,
            "Consensus reached"
        );

        Decision {
            claim_id: claim_id.clone(),
            label,
            confidence: tally.mean,
            risk_factors,
            recommendations: label.recommendations(),
            scores,
            processing_time_ms: processing_time.as_millis() as u64,
        }
    }
}

fn high_risk_factor(result: &ScoreResult, score: f64) -> String {
    let rationale = result.rationale.trim();
    if rationale.is_empty() {
        format!("High risk detected by {} (score: {:.2})", result.scorer_id, score)
    } else {
        format!(
            "High risk detected by {} (score: {:.2}): {}",
            result.scorer_id, score, rationale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::ScoreFailure;

    fn scored(id: &str, score: f64) -> ScoreResult {
        ScoreResult::scored(id, "1.0", score, format!("{} rationale", id), 5).unwrap()
    }

    fn engine() -> ConsensusEngine {
        ConsensusEngine::new(ConsensusConfig::default()).unwrap()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let tally = engine().tally(&[scored("a", 0.7)], 1);
        assert_eq!(tally.high_risk, 1);
    }

    #[test]
    fn test_exactly_half_unknown_is_not_insufficient() {
        let results = vec![
            scored("a", 0.1),
            ScoreResult::unknown("b", "1.0", ScoreFailure::Timeout, "", 0),
        ];
        let tally = engine().tally(&results, 2);
        assert!(!tally.insufficient());
        assert_eq!(engine().label(&tally), DecisionLabel::Approve);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = ConsensusConfig { fraud_threshold: 1.5, consensus_threshold: 3 };
        assert!(ConsensusEngine::new(bad).is_err());
        let zero = ConsensusConfig { fraud_threshold: 0.7, consensus_threshold: 0 };
        assert!(ConsensusEngine::new(zero).is_err());
    }
}
