//! Analytical specialties

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The specialties a scorer set is assembled from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerSpecialty {
    /// Narrative and social-signal analysis
    Social,
    /// Contact and network reputation
    Network,
    /// Payment and ledger transaction forensics
    Blockchain,
    /// Medical procedure-code consistency
    Medical,
    /// Incident location verification
    Geospatial,
}

impl ScorerSpecialty {
    pub const ALL: [ScorerSpecialty; 5] = [
        ScorerSpecialty::Social,
        ScorerSpecialty::Network,
        ScorerSpecialty::Blockchain,
        ScorerSpecialty::Medical,
        ScorerSpecialty::Geospatial,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            ScorerSpecialty::Social => "social",
            ScorerSpecialty::Network => "network",
            ScorerSpecialty::Blockchain => "blockchain",
            ScorerSpecialty::Medical => "medical",
            ScorerSpecialty::Geospatial => "geospatial",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            ScorerSpecialty::Social => "2.1",
            ScorerSpecialty::Network => "2.1",
            ScorerSpecialty::Blockchain => "1.3",
            ScorerSpecialty::Medical => "1.0",
            ScorerSpecialty::Geospatial => "1.2",
        }
    }
}

impl fmt::Display for ScorerSpecialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ScorerSpecialty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScorerSpecialty::ALL
            .into_iter()
            .find(|specialty| specialty.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown scorer specialty: {}", s))
    }
}
