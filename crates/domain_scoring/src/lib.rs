//! Scoring Domain
//!
//! This crate defines the contract every risk scorer satisfies and ships a
//! deterministic rule-based implementation for each analytical specialty.
//!
//! # Architecture
//!
//! ```text
//! engine_batch::ClaimPipeline
//!         │  Arc<dyn ScorerAdapter>
//!         ▼
//!  ┌───────────────┬──────────────────┬───────────────┐
//!  │ RuleBasedScorer │ remote reasoning │ test doubles │
//!  └───────────────┴──────────────────┴───────────────┘
//! ```

pub mod scorer;
pub mod specialty;
pub mod rule_based;
pub mod error;

pub use scorer::{ScorerAdapter, ScoreAssessment};
pub use specialty::ScorerSpecialty;
pub use rule_based::RuleBasedScorer;
pub use error::ScorerError;
