//! Running decision counters

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use core_kernel::ClaimId;
use domain_claims::{Decision, DecisionLabel};

/// Number of recent decisions kept for the stats view
pub const RECENT_DECISIONS: usize = 10;

/// One line of the recent decision log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionSummary {
    pub claim_id: ClaimId,
    pub label: DecisionLabel,
    pub confidence: f64,
    pub decided_at: DateTime<Utc>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_processed: u64,
    pub approved: u64,
    pub escalated: u64,
    pub rejected: u64,
    /// Most recent first
    pub recent: Vec<DecisionSummary>,
}

#[derive(Debug, Default)]
pub(crate) struct PipelineStats {
    inner: Mutex<StatsSnapshot>,
}

impl PipelineStats {
    pub(crate) fn record(&self, decision: &Decision) {
        let mut stats = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        stats.total_processed += 1;
        match decision.label {
            DecisionLabel::Approve => stats.approved += 1,
            DecisionLabel::Escalate => stats.escalated += 1,
            DecisionLabel::Reject => stats.rejected += 1,
        }

        let mut recent: VecDeque<DecisionSummary> = std::mem::take(&mut stats.recent).into();
        recent.push_front(DecisionSummary {
            claim_id: decision.claim_id.clone(),
            label: decision.label,
            confidence: decision.confidence,
            decided_at: Utc::now(),
        });
        recent.truncate(RECENT_DECISIONS);
        stats.recent = recent.into();
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn decision(label: DecisionLabel) -> Decision {
        Decision {
            claim_id: ClaimId::generate(),
            label,
            confidence: 0.5,
            risk_factors: vec![],
            recommendations: label.recommendations(),
            scores: BTreeMap::new(),
            processing_time_ms: 1,
        }
    }

    #[test]
    fn test_counts_by_label() {
        let stats = PipelineStats::default();
        stats.record(&decision(DecisionLabel::Approve));
        stats.record(&decision(DecisionLabel::Reject));
        stats.record(&decision(DecisionLabel::Reject));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_processed, 3);
        assert_eq!(snapshot.approved, 1);
        assert_eq!(snapshot.rejected, 2);
        assert_eq!(snapshot.escalated, 0);
    }

    #[test]
    fn test_recent_log_is_bounded_and_newest_first() {
        let stats = PipelineStats::default();
        let mut last = None;
        for _ in 0..15 {
            let d = decision(DecisionLabel::Escalate);
            last = Some(d.claim_id.clone());
            stats.record(&d);
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.recent.len(), RECENT_DECISIONS);
        assert_eq!(Some(snapshot.recent[0].claim_id.clone()), last);
    }
}
