//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use core_kernel::ClaimId;
use domain_claims::{Claim, ConsensusConfig, ConsensusEngine};
use domain_scoring::{RuleBasedScorer, ScorerAdapter};
use engine_batch::{BatchJobManager, ClaimPipeline, EngineConfig};

use crate::fixtures::{ClaimFixtures, EngineFixtures};

/// Builder for constructing test claims
pub struct ClaimBuilder {
    claim: Claim,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// Starts from the clean claim fixture with a fresh id
    pub fn new() -> Self {
        let mut claim = ClaimFixtures::clean();
        claim.id = ClaimId::generate();
        Self { claim }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.claim.id = ClaimFixtures::id(id);
        self
    }

    pub fn with_claimant(mut self, claimant: impl Into<String>) -> Self {
        self.claim.claimant = claimant.into();
        self
    }

    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.claim.narrative = narrative.into();
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.claim.amount = Some(amount);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.claim.location = Some(location.into());
        self
    }

    pub fn without_location(mut self) -> Self {
        self.claim.location = None;
        self
    }

    pub fn without_contact(mut self) -> Self {
        self.claim.contact = None;
        self
    }

    pub fn with_domain_codes(mut self, codes: &[&str]) -> Self {
        self.claim.domain_codes = codes.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_transaction_ref(mut self, reference: impl Into<String>) -> Self {
        self.claim.transaction_refs.push(reference.into());
        self
    }

    pub fn build(self) -> Claim {
        self.claim
    }
}

/// Builder that wires scorers into a pipeline and job manager
pub struct EngineBuilder {
    scorers: Vec<Arc<dyn ScorerAdapter>>,
    consensus: ConsensusConfig,
    config: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            scorers: Vec::new(),
            consensus: ConsensusConfig::default(),
            config: EngineFixtures::config(),
        }
    }

    pub fn with_scorer(mut self, scorer: impl ScorerAdapter) -> Self {
        self.scorers.push(Arc::new(scorer));
        self
    }

    pub fn with_scorers(mut self, scorers: Vec<Arc<dyn ScorerAdapter>>) -> Self {
        self.scorers.extend(scorers);
        self
    }

    /// One rule-based scorer per specialty
    pub fn with_rule_based_scorers(mut self) -> Self {
        for scorer in RuleBasedScorer::full_set() {
            self.scorers.push(Arc::new(scorer));
        }
        self
    }

    pub fn with_consensus(mut self, fraud_threshold: f64, consensus_threshold: usize) -> Self {
        self.consensus = ConsensusConfig {
            fraud_threshold,
            consensus_threshold,
        };
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.config = self.config.with_worker_pool_size(size);
        self
    }

    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_scorer_timeout(timeout);
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_heartbeat_interval(interval);
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.config = self.config.with_max_batch_size(size);
        self
    }

    pub fn build_pipeline(self) -> ClaimPipeline {
        let engine = ConsensusEngine::new(self.consensus).unwrap();
        ClaimPipeline::new(self.scorers, engine, self.config.scorer_timeout).unwrap()
    }

    pub fn build(self) -> BatchJobManager {
        let config = self.config.with_consensus(self.consensus);
        BatchJobManager::new(self.scorers, config).unwrap()
    }
}
