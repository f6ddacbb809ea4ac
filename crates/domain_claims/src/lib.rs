//! Claims Domain
//!
//! This crate holds the claim model and the deterministic half of fraud
//! evaluation: the results scorers produce and the consensus engine that
//! turns them into a decision.
//!
//! # Evaluation flow
//!
//! ```text
//! Claim -> N x ScoreResult (scored or unknown) -> ConsensusEngine -> Decision
//! ```

pub mod claim;
pub mod score;
pub mod decision;
pub mod consensus;
pub mod error;

pub use claim::Claim;
pub use score::{ScoreResult, ScoreValue, ScoreFailure};
pub use decision::{Decision, DecisionLabel};
pub use consensus::{ConsensusConfig, ConsensusEngine, ConsensusTally, INSUFFICIENT_DATA_FACTOR};
pub use error::ClaimError;
