//! Claim submitted for fraud evaluation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::ClaimId;
use crate::error::ClaimError;

/// A claim submitted for fraud evaluation
///
/// Claims are immutable once handed to a pipeline run; the engine shares them
/// behind an `Arc` and no scorer receives a mutable reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Caller-supplied or generated identifier
    pub id: ClaimId,
    /// Claimant name
    pub claimant: String,
    /// Free-text description of the incident
    pub narrative: String,
    /// Claimed amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Date of the incident
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_date: Option<NaiveDate>,
    /// Policy number the claim is made against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    /// Location of the incident (address or "lat,lon")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Claimant contact address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// References to supporting documents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supporting_documents: Vec<String>,
    /// Domain codes (e.g. ICD-10 / CPT medical codes)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_codes: Vec<String>,
    /// Payment or ledger transaction references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transaction_refs: Vec<String>,
}

impl Claim {
    /// Creates a claim with a generated identifier
    pub fn new(claimant: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self::with_id(ClaimId::generate(), claimant, narrative)
    }

    /// Creates a claim with a caller-supplied identifier
    pub fn with_id(id: ClaimId, claimant: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            id,
            claimant: claimant.into(),
            narrative: narrative.into(),
            amount: None,
            incident_date: None,
            policy_number: None,
            location: None,
            contact: None,
            supporting_documents: Vec::new(),
            domain_codes: Vec::new(),
            transaction_refs: Vec::new(),
        }
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn incident_date(mut self, date: NaiveDate) -> Self {
        self.incident_date = Some(date);
        self
    }

    pub fn policy_number(mut self, policy_number: impl Into<String>) -> Self {
        self.policy_number = Some(policy_number.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn supporting_document(mut self, reference: impl Into<String>) -> Self {
        self.supporting_documents.push(reference.into());
        self
    }

    pub fn domain_code(mut self, code: impl Into<String>) -> Self {
        self.domain_codes.push(code.into());
        self
    }

    pub fn transaction_ref(mut self, reference: impl Into<String>) -> Self {
        self.transaction_refs.push(reference.into());
        self
    }

    /// Checks the fields every pipeline run relies on
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.claimant.trim().is_empty() {
            return Err(ClaimError::MissingClaimant);
        }
        if self.narrative.trim().is_empty() {
            return Err(ClaimError::MissingNarrative);
        }
        if let Some(amount) = self.amount {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(ClaimError::NegativeAmount(amount.to_string()));
            }
        }
        Ok(())
    }
}
