//! Claim Analysis Pipeline
//!
//! Fans one claim out to every configured [`ScorerAdapter`] concurrently,
//! bounds each call by the scorer timeout, converts failures into sentinel
//! results and hands the collected results to the [`ConsensusEngine`].
//!
//! # Guarantees
//!
//! - Every configured scorer contributes exactly one [`ScoreResult`]
//! - Results keep scorer submission order regardless of completion order
//! - A scorer failure never fails the claim
//! - Total latency is bounded by the scorer timeout plus consensus time

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info, warn};

use core_kernel::CoreError;
use domain_claims::{Claim, ConsensusEngine, Decision, ScoreResult};
use domain_scoring::{ScorerAdapter, ScorerError};

use crate::stats::{PipelineStats, StatsSnapshot};

/// Runs claims through the configured scorers and the consensus engine
pub struct ClaimPipeline {
    scorers: Vec<Arc<dyn ScorerAdapter>>,
    engine: ConsensusEngine,
    scorer_timeout: Duration,
    stats: PipelineStats,
}

impl ClaimPipeline {
    /// Creates a pipeline over `scorers`, in the order given
    ///
    /// Scorer identifiers must be unique. An empty scorer list is accepted;
    /// the job manager refuses to process batches against it.
    pub fn new(
        scorers: Vec<Arc<dyn ScorerAdapter>>,
        engine: ConsensusEngine,
        scorer_timeout: Duration,
    ) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        for scorer in &scorers {
            if !seen.insert(scorer.id().to_string()) {
                return Err(CoreError::configuration(format!(
                    "duplicate scorer id: {}",
                    scorer.id()
                )));
            }
        }
        if scorer_timeout.is_zero() {
            return Err(CoreError::configuration("scorer_timeout must be positive"));
        }

        info!(
            scorers = scorers.len(),
            timeout_ms = scorer_timeout.as_millis() as u64,
            "Claim pipeline configured"
        );

        Ok(Self {
            scorers,
            engine,
            scorer_timeout,
            stats: PipelineStats::default(),
        })
    }

    pub fn scorer_count(&self) -> usize {
        self.scorers.len()
    }

    /// `(id, version)` for each scorer, in submission order
    pub fn scorer_versions(&self) -> Vec<(String, String)> {
        self.scorers
            .iter()
            .map(|s| (s.id().to_string(), s.version().to_string()))
            .collect()
    }

    pub fn engine(&self) -> &ConsensusEngine {
        &self.engine
    }

    pub fn scorer_timeout(&self) -> Duration {
        self.scorer_timeout
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Analyzes one claim and returns its decision
    pub async fn run(&self, claim: Arc<Claim>) -> Decision {
        let started = Instant::now();

        let calls = self
            .scorers
            .iter()
            .map(|scorer| self.invoke(Arc::clone(scorer), Arc::clone(&claim)));
        let results = join_all(calls).await;

        let decision = self
            .engine
            .decide(&claim.id, &results, self.scorers.len(), started.elapsed());
        self.stats.record(&decision);
        decision
    }

    async fn invoke(&self, scorer: Arc<dyn ScorerAdapter>, claim: Arc<Claim>) -> ScoreResult {
        let started = Instant::now();
        let scorer_id = scorer.id().to_string();
        let version = scorer.version().to_string();

        // The call runs on its own task so a timed-out scorer is detached
        // rather than cancelled; whatever it returns later is discarded.
        let call = tokio::spawn(async move { scorer.evaluate(&claim).await });

        let outcome = match tokio::time::timeout(self.scorer_timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_error)) => Err(ScorerError::upstream(
                &scorer_id,
                format!("scorer call aborted: {}", join_error),
            )),
            Err(_) => Err(ScorerError::Timeout {
                scorer: scorer_id.clone(),
                timeout_ms: self.scorer_timeout.as_millis() as u64,
            }),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        let error = match outcome {
            Ok(assessment) => {
                match ScoreResult::scored(&scorer_id, &version, assessment.score, assessment.rationale, latency_ms) {
                    Ok(result) => {
                        debug!(scorer = %scorer_id, latency_ms, "Scorer answered");
                        return result;
                    }
                    Err(invalid) => ScorerError::upstream(&scorer_id, invalid.to_string()),
                }
            }
            Err(error) => error,
        };

        warn!(scorer = %scorer_id, latency_ms, error = %error, "Scorer produced no usable value");
        ScoreResult::unknown(scorer_id, version, error.failure(), error.to_string(), latency_ms)
    }
}

impl std::fmt::Debug for ClaimPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimPipeline")
            .field("scorers", &self.scorer_versions())
            .field("engine", &self.engine)
            .field("scorer_timeout", &self.scorer_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain_claims::{ConsensusConfig, DecisionLabel, ScoreFailure};
    use domain_scoring::ScoreAssessment;

    struct Constant(&'static str, f64);

    #[async_trait]
    impl ScorerAdapter for Constant {
        fn id(&self) -> &str {
            self.0
        }

        fn version(&self) -> &str {
            "1.0"
        }

        async fn evaluate(&self, _claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
            Ok(ScoreAssessment::new(self.1, "fixed"))
        }
    }

    fn engine() -> ConsensusEngine {
        ConsensusEngine::new(ConsensusConfig::default()).unwrap()
    }

    #[test]
    fn test_duplicate_scorer_ids_are_rejected() {
        let scorers: Vec<Arc<dyn ScorerAdapter>> =
            vec![Arc::new(Constant("a", 0.1)), Arc::new(Constant("a", 0.2))];
        let result = ClaimPipeline::new(scorers, engine(), Duration::from_secs(1));
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_score_becomes_upstream_error() {
        let scorers: Vec<Arc<dyn ScorerAdapter>> =
            vec![Arc::new(Constant("bad", 1.4)), Arc::new(Constant("good", 0.2))];
        let pipeline = ClaimPipeline::new(scorers, engine(), Duration::from_secs(1)).unwrap();

        let decision = pipeline.run(Arc::new(Claim::new("A", "B"))).await;

        let bad = decision.score_for("bad").unwrap();
        assert_eq!(bad.failure(), Some(ScoreFailure::UpstreamError));
        assert_eq!(decision.score_for("good").unwrap().score(), Some(0.2));
        // one of two unavailable is not a majority
        assert_eq!(decision.label, DecisionLabel::Approve);
    }

    #[tokio::test]
    async fn test_run_records_stats() {
        let scorers: Vec<Arc<dyn ScorerAdapter>> = vec![Arc::new(Constant("a", 0.1))];
        let pipeline = ClaimPipeline::new(scorers, engine(), Duration::from_secs(1)).unwrap();

        pipeline.run(Arc::new(Claim::new("A", "B"))).await;

        let stats = pipeline.stats();
        assert_eq!(stats.total_processed, 1);
        assert_eq!(stats.approved, 1);
    }
}
