//! Tests for the scoring domain

use rust_decimal_macros::dec;

use domain_claims::{Claim, ScoreFailure};
use domain_scoring::{RuleBasedScorer, ScorerAdapter, ScorerError, ScorerSpecialty};

fn base_claim() -> Claim {
    Claim::new("Jane Smith", "Rear-ended at a traffic light")
        .amount(dec!(1800))
        .contact("jane@example.com")
        .location("34.0522,-118.2437")
        .supporting_document("police_report.pdf")
}

mod error_tests {
    use super::*;

    #[test]
    fn test_errors_map_to_sentinel_failures() {
        let timeout = ScorerError::Timeout { scorer: "social".into(), timeout_ms: 30_000 };
        assert_eq!(timeout.failure(), ScoreFailure::Timeout);
        assert_eq!(ScorerError::upstream("network", "503").failure(), ScoreFailure::UpstreamError);
        assert_eq!(ScorerError::invalid_input("geospatial", "location").failure(), ScoreFailure::InvalidInput);
    }

    #[test]
    fn test_error_display_names_scorer() {
        let error = ScorerError::invalid_input("network", "contact");
        assert_eq!(error.to_string(), "Claim is missing contact required by network");
    }
}

mod rule_based_tests {
    use super::*;

    #[tokio::test]
    async fn test_identity_comes_from_specialty() {
        let scorer = RuleBasedScorer::new(ScorerSpecialty::Blockchain);
        assert_eq!(scorer.id(), "blockchain");
        assert_eq!(scorer.version(), "1.3");
    }

    #[tokio::test]
    async fn test_clean_claim_scores_low_everywhere() {
        let claim = base_claim();
        for scorer in RuleBasedScorer::full_set() {
            let assessment = scorer.evaluate(&claim).await.unwrap();
            assert!(assessment.score < 0.7, "{} scored {}", scorer.id(), assessment.score);
            assert!(!assessment.rationale.is_empty());
        }
    }

    #[tokio::test]
    async fn test_social_counts_red_flags() {
        let claim = Claim::new("John Doe", "Total loss, no witnesses, cash only please. Urgent!");
        let assessment = RuleBasedScorer::new(ScorerSpecialty::Social).evaluate(&claim).await.unwrap();
        assert!(assessment.score >= 0.7);
        assert!(assessment.rationale.contains("no witnesses"));
    }

    #[tokio::test]
    async fn test_network_requires_contact() {
        let claim = Claim::new("John Doe", "Laptop damaged");
        let error = RuleBasedScorer::new(ScorerSpecialty::Network).evaluate(&claim).await.unwrap_err();
        assert_eq!(error.failure(), ScoreFailure::InvalidInput);
    }

    #[tokio::test]
    async fn test_network_flags_disposable_mail() {
        let claim = base_claim().contact("x@mailinator.com");
        let assessment = RuleBasedScorer::new(ScorerSpecialty::Network).evaluate(&claim).await.unwrap();
        assert!(assessment.score >= 0.7);
    }

    #[tokio::test]
    async fn test_blockchain_flags_mixers() {
        let claim = base_claim().transaction_ref("0xabc-tornado-cash");
        let assessment = RuleBasedScorer::new(ScorerSpecialty::Blockchain).evaluate(&claim).await.unwrap();
        assert_eq!(assessment.score, 0.9);
    }

    #[tokio::test]
    async fn test_medical_flags_code_stuffing() {
        let claim = (0..6).fold(base_claim(), |claim, i| claim.domain_code(format!("CPT:9921{}", i)));
        let assessment = RuleBasedScorer::new(ScorerSpecialty::Medical).evaluate(&claim).await.unwrap();
        assert_eq!(assessment.score, 0.75);
    }

    #[tokio::test]
    async fn test_geospatial_requires_location() {
        let mut claim = base_claim();
        claim.location = None;
        let error = RuleBasedScorer::new(ScorerSpecialty::Geospatial).evaluate(&claim).await.unwrap_err();
        assert!(matches!(error, ScorerError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_geospatial_rejects_impossible_coordinates() {
        let claim = base_claim().location("123.0,-500.0");
        let assessment = RuleBasedScorer::new(ScorerSpecialty::Geospatial).evaluate(&claim).await.unwrap();
        assert_eq!(assessment.score, 0.9);
    }

    #[tokio::test]
    async fn test_evaluation_does_not_mutate_claim() {
        let claim = base_claim();
        let before = claim.clone();
        for scorer in RuleBasedScorer::full_set() {
            let _ = scorer.evaluate(&claim).await;
        }
        assert_eq!(claim, before);
    }
}
