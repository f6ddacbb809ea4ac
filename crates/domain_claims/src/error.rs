//! Claims domain errors

use thiserror::Error;

use core_kernel::CoreError;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Invalid claim identifier: {0}")]
    InvalidId(#[from] CoreError),

    #[error("Claimant name is required")]
    MissingClaimant,

    #[error("Claim narrative is required")]
    MissingNarrative,

    #[error("Claimed amount must not be negative: {0}")]
    NegativeAmount(String),

    #[error("Score {score} from {scorer} is outside [0, 1]")]
    ScoreOutOfRange { scorer: String, score: f64 },
}
