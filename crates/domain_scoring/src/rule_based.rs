//! Rule-based scorers
//!
//! A deterministic backend for every [`ScorerSpecialty`]. It stands in for the
//! remote reasoning service when none is configured and gives each specialty
//! a simple, explainable heuristic over the claim's structured fields.

use async_trait::async_trait;
use tracing::debug;

use domain_claims::Claim;
use crate::error::ScorerError;
use crate::scorer::{ScoreAssessment, ScorerAdapter};
use crate::specialty::ScorerSpecialty;

const NARRATIVE_RED_FLAGS: &[&str] = &[
    "total loss",
    "cash only",
    "no witnesses",
    "lost receipt",
    "urgent",
    "stolen",
    "cannot provide",
];

const DISPOSABLE_MAIL_DOMAINS: &[&str] = &["mailinator.", "tempmail.", "guerrillamail.", "10minutemail."];

const MIXER_MARKERS: &[&str] = &["mixer", "tumbler", "tornado"];

/// Heuristic scorer for one specialty
#[derive(Debug, Clone, Copy)]
pub struct RuleBasedScorer {
    specialty: ScorerSpecialty,
}

impl RuleBasedScorer {
    pub fn new(specialty: ScorerSpecialty) -> Self {
        Self { specialty }
    }

    /// One scorer per specialty, in canonical order
    pub fn full_set() -> Vec<RuleBasedScorer> {
        ScorerSpecialty::ALL.into_iter().map(Self::new).collect()
    }

    pub fn specialty(&self) -> ScorerSpecialty {
        self.specialty
    }

    fn assess(&self, claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
        match self.specialty {
            ScorerSpecialty::Social => Ok(social(claim)),
            ScorerSpecialty::Network => network(claim),
            ScorerSpecialty::Blockchain => Ok(blockchain(claim)),
            ScorerSpecialty::Medical => Ok(medical(claim)),
            ScorerSpecialty::Geospatial => geospatial(claim),
        }
    }
}

#[async_trait]
impl ScorerAdapter for RuleBasedScorer {
    fn id(&self) -> &str {
        self.specialty.id()
    }

    fn version(&self) -> &str {
        self.specialty.version()
    }

    async fn evaluate(&self, claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
        let assessment = self.assess(claim)?;
        debug!(
            scorer = self.specialty.id(),
            claim_id = %claim.id,
            score = assessment.score,
            "Rule-based assessment"
        );
        Ok(assessment)
    }
}

fn social(claim: &Claim) -> ScoreAssessment {
    let narrative = claim.narrative.to_lowercase();
    let hits: Vec<&str> = NARRATIVE_RED_FLAGS
        .iter()
        .copied()
        .filter(|flag| narrative.contains(flag))
        .collect();

    if hits.is_empty() {
        return ScoreAssessment::new(0.1, "Narrative carries no known red-flag phrasing");
    }
    let score = (0.3 + 0.2 * hits.len() as f64).min(1.0);
    ScoreAssessment::new(score, format!("Narrative red flags: {}", hits.join(", ")))
}

fn network(claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
    let contact = claim
        .contact
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ScorerError::invalid_input(ScorerSpecialty::Network.id(), "contact"))?
        .to_lowercase();

    if DISPOSABLE_MAIL_DOMAINS.iter().any(|domain| contact.contains(domain)) {
        return Ok(ScoreAssessment::new(0.85, "Contact uses a disposable mail domain"));
    }
    if claim.supporting_documents.is_empty() {
        return Ok(ScoreAssessment::new(0.35, "Reachable contact but no supporting documents"));
    }
    Ok(ScoreAssessment::new(0.1, "Contact and documentation look consistent"))
}

fn blockchain(claim: &Claim) -> ScoreAssessment {
    if claim.transaction_refs.is_empty() {
        return ScoreAssessment::new(0.05, "No transactions referenced");
    }
    let flagged = claim.transaction_refs.iter().any(|reference| {
        let reference = reference.to_lowercase();
        MIXER_MARKERS.iter().any(|marker| reference.contains(marker))
    });
    if flagged {
        return ScoreAssessment::new(0.9, "Transaction routed through a mixing service");
    }
    let score = (0.15 + 0.1 * claim.transaction_refs.len() as f64).min(0.6);
    ScoreAssessment::new(
        score,
        format!("{} transaction reference(s) with no mixer activity", claim.transaction_refs.len()),
    )
}

fn medical(claim: &Claim) -> ScoreAssessment {
    match claim.domain_codes.len() {
        0 => ScoreAssessment::new(0.05, "No medical codes to assess"),
        n if n > 4 => ScoreAssessment::new(0.75, format!("{} procedure codes on a single claim", n)),
        n => ScoreAssessment::new(0.2, format!("{} procedure code(s), consistent volume", n)),
    }
}

fn geospatial(claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
    let location = claim
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ScorerError::invalid_input(ScorerSpecialty::Geospatial.id(), "location"))?;

    let Some((lat, lon)) = parse_coordinates(location) else {
        return Ok(ScoreAssessment::new(0.4, "Location given as free text, not verifiable"));
    };
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Ok(ScoreAssessment::new(0.1, format!("Coordinates {:.4},{:.4} verified", lat, lon)))
    } else {
        Ok(ScoreAssessment::new(0.9, "Coordinates outside valid range"))
    }
}

fn parse_coordinates(location: &str) -> Option<(f64, f64)> {
    let (lat, lon) = location.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}
