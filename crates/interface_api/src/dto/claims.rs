//! Claims DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::ClaimId;
use domain_claims::{Claim, Decision};

use crate::error::ApiError;

/// A claim as submitted over HTTP
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClaimRequest {
    /// Generated when absent
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub claim_id: Option<String>,
    #[validate(length(min = 1, max = 256))]
    pub claimant: String,
    #[validate(length(min = 1, max = 20000))]
    pub narrative: String,
    pub amount: Option<Decimal>,
    pub incident_date: Option<NaiveDate>,
    pub policy_number: Option<String>,
    pub location: Option<String>,
    #[validate(length(max = 320))]
    pub contact: Option<String>,
    #[serde(default)]
    pub supporting_documents: Vec<String>,
    #[serde(default)]
    pub domain_codes: Vec<String>,
    #[serde(default)]
    pub transaction_refs: Vec<String>,
}

impl ClaimRequest {
    pub fn into_claim(self) -> Result<Claim, ApiError> {
        let id = match self.claim_id {
            Some(id) => ClaimId::new(id).map_err(|e| ApiError::BadRequest(e.to_string()))?,
            None => ClaimId::generate(),
        };
        Ok(Claim {
            id,
            claimant: self.claimant,
            narrative: self.narrative,
            amount: self.amount,
            incident_date: self.incident_date,
            policy_number: self.policy_number,
            location: self.location,
            contact: self.contact,
            supporting_documents: self.supporting_documents,
            domain_codes: self.domain_codes,
            transaction_refs: self.transaction_refs,
        })
    }
}

/// Decision returned by the synchronous analysis endpoint
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub claim_id: ClaimId,
    pub decision: Decision,
}
