//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use proptest::prelude::*;

use core_kernel::ClaimId;
use domain_claims::{Claim, ScoreFailure, ScoreResult};

/// Strategy for generating scores within [0, 1]
pub fn score_strategy() -> impl Strategy<Value = f64> {
    0.0f64..=1.0f64
}

/// Strategy for generating sentinel failure categories
pub fn failure_strategy() -> impl Strategy<Value = ScoreFailure> {
    prop_oneof![
        Just(ScoreFailure::Timeout),
        Just(ScoreFailure::UpstreamError),
        Just(ScoreFailure::InvalidInput),
    ]
}

/// Strategy for generating one scorer outcome: a score or a failure
pub fn score_outcome_strategy() -> impl Strategy<Value = Result<f64, ScoreFailure>> {
    prop_oneof![
        3 => score_strategy().prop_map(Ok),
        1 => failure_strategy().prop_map(Err),
    ]
}

/// Strategy for generating a full result set with unique scorer ids
pub fn score_results_strategy(max_scorers: usize) -> impl Strategy<Value = Vec<ScoreResult>> {
    prop::collection::vec(score_outcome_strategy(), 1..=max_scorers.max(1)).prop_map(|outcomes| {
        outcomes
            .into_iter()
            .enumerate()
            .map(|(i, outcome)| {
                let id = format!("scorer-{}", i);
                match outcome {
                    Ok(score) => ScoreResult::scored(id, "1.0", score, "generated", 1).unwrap(),
                    Err(failure) => ScoreResult::unknown(id, "1.0", failure, "generated", 1),
                }
            })
            .collect()
    })
}

/// Strategy for generating valid claims
pub fn claim_strategy() -> impl Strategy<Value = Claim> {
    ("[A-Z]{3}-[0-9]{3,6}", "[A-Z][a-z]{2,10} [A-Z][a-z]{2,10}", "[a-z ]{5,60}")
        .prop_filter("narrative must not be blank", |(_, _, n)| !n.trim().is_empty())
        .prop_map(|(id, claimant, narrative)| {
            Claim::with_id(ClaimId::new(id).unwrap(), claimant, narrative)
        })
}
