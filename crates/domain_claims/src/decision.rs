//! Fraud decision produced for one claim

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use core_kernel::ClaimId;
use crate::score::ScoreResult;

/// Decision label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionLabel {
    /// No high-risk signal; process normally
    Approve,
    /// Some risk or too little evidence; a human must look
    Escalate,
    /// Scorer consensus on fraud
    Reject,
}

impl DecisionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionLabel::Approve => "APPROVE",
            DecisionLabel::Escalate => "ESCALATE",
            DecisionLabel::Reject => "REJECT",
        }
    }

    /// Fixed recommendation table, independent of which scorers fired
    pub fn recommendations(&self) -> Vec<String> {
        let lines: &[&str] = match self {
            DecisionLabel::Reject => &[
                "Recommend manual review",
                "Contact claimant for additional documentation",
                "Refer the claim to the special investigations unit",
            ],
            DecisionLabel::Escalate => &[
                "Request supporting evidence for the flagged risk factors",
                "Route to a senior adjuster before settlement",
            ],
            DecisionLabel::Approve => &["Proceed with standard claim processing"],
        };
        lines.iter().map(|line| line.to_string()).collect()
    }
}

impl fmt::Display for DecisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal artifact of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub claim_id: ClaimId,
    pub label: DecisionLabel,
    /// Mean of the known scores, 0 when none are known
    pub confidence: f64,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    /// Scorer identifier -> result, including sentinel results
    pub scores: BTreeMap<String, ScoreResult>,
    pub processing_time_ms: u64,
}

impl Decision {
    pub fn score_for(&self, scorer_id: &str) -> Option<&ScoreResult> {
        self.scores.get(scorer_id)
    }

    pub fn unknown_count(&self) -> usize {
        self.scores.values().filter(|r| r.is_unknown()).count()
    }
}
