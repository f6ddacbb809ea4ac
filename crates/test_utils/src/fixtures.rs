//! Pre-built Test Fixtures
//!
//! Provides ready-to-use claims and engine settings. These fixtures are
//! designed to be consistent and predictable for unit tests.

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::ClaimId;
use domain_claims::{Claim, ConsensusConfig, ConsensusEngine};
use engine_batch::EngineConfig;

/// Fixture for claim test data
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// A claim no rule-based scorer finds suspicious
    pub fn clean() -> Claim {
        Claim::with_id(
            Self::id("CLM-001"),
            "Jane Smith",
            "Rear-ended at a traffic light, police attended",
        )
        .amount(dec!(1800.00))
        .incident_date(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())
        .policy_number("POL-2024-001")
        .location("34.0522,-118.2437")
        .contact("jane.smith@example.com")
        .supporting_document("police_report.pdf")
    }

    /// A claim most rule-based scorers flag
    pub fn suspicious() -> Claim {
        Claim::with_id(
            Self::id("CLM-002"),
            "John Doe",
            "Total loss, no witnesses. Lost receipt, cash only. Urgent!",
        )
        .amount(dec!(48000.00))
        .policy_number("POL-2024-002")
        .location("123.0,-500.0")
        .contact("jd@mailinator.com")
        .transaction_ref("0xabc-tornado-cash")
    }

    /// `n` distinct valid claims with ids `CLM-1000`, `CLM-1001`, ...
    pub fn batch(n: usize) -> Vec<Claim> {
        (0..n)
            .map(|i| {
                Claim::with_id(
                    Self::id(&format!("CLM-{}", 1000 + i)),
                    format!("Claimant {}", i),
                    format!("Water damage in unit {}", i),
                )
                .contact(format!("claimant{}@example.com", i))
                .location("40.7128,-74.0060")
                .supporting_document(format!("photo_{}.jpg", i))
            })
            .collect()
    }

    pub fn id(value: &str) -> ClaimId {
        ClaimId::new(value).unwrap()
    }
}

/// Fixture for engine settings
pub struct EngineFixtures;

impl EngineFixtures {
    /// Default thresholds: fraud 0.7, consensus 3
    pub fn consensus() -> ConsensusEngine {
        ConsensusEngine::new(ConsensusConfig::default()).unwrap()
    }

    /// Settings suited to tests: short timeout, pool of 2
    pub fn config() -> EngineConfig {
        EngineConfig::default()
            .with_worker_pool_size(2)
            .with_scorer_timeout(Duration::from_millis(500))
            .with_heartbeat_interval(Duration::from_secs(30))
    }
}
