//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for decisions and progress streams
//! that give more meaningful error messages than standard assertions.

use domain_claims::{Claim, Decision, DecisionLabel};
use engine_batch::{BatchResults, ProgressMessage};

/// Asserts a decision's label, printing its risk factors on failure
pub fn assert_label(decision: &Decision, expected: DecisionLabel) {
    assert_eq!(
        decision.label, expected,
        "Claim {} labelled {} (confidence {:.3}), risk factors: {:?}",
        decision.claim_id, decision.label, decision.confidence, decision.risk_factors
    );
}

/// Asserts that two confidences are equal within `tolerance`
pub fn assert_confidence_approx_eq(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "Confidence differs by more than tolerance: actual={}, expected={}, tolerance={}",
        actual,
        expected,
        tolerance
    );
}

/// Asserts every slot is decided and the decisions follow submission order
pub fn assert_results_in_submission_order(results: &BatchResults, claims: &[Claim]) {
    assert_eq!(
        results.outcomes.len(),
        claims.len(),
        "Expected {} outcomes, got {}",
        claims.len(),
        results.outcomes.len()
    );
    for (index, (outcome, claim)) in results.outcomes.iter().zip(claims).enumerate() {
        let decision = outcome
            .decision()
            .unwrap_or_else(|| panic!("Outcome {} is not a decision: {:?}", index, outcome));
        assert_eq!(
            decision.claim_id, claim.id,
            "Outcome {} belongs to {}, expected {}",
            index, decision.claim_id, claim.id
        );
    }
}

/// Asserts the percentages in a progress stream never decrease
pub fn assert_progress_monotonic(messages: &[ProgressMessage]) {
    let percents: Vec<u8> = messages.iter().filter_map(ProgressMessage::percent).collect();
    for pair in percents.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "Progress went backwards: {} -> {} in {:?}",
            pair[0],
            pair[1],
            percents
        );
    }
}

/// Asserts a stream carries exactly one terminal message, and it is last
pub fn assert_single_terminal_last(messages: &[ProgressMessage]) {
    let terminals: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_terminal())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(
        terminals.len(),
        1,
        "Expected exactly one terminal message, got {:?}",
        messages.iter().map(ProgressMessage::kind).collect::<Vec<_>>()
    );
    assert_eq!(terminals[0], messages.len() - 1, "Terminal message is not last");
}
