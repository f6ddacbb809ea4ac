//! Strongly-typed identifiers for engine entities
//!
//! Engine-issued identifiers are newtype wrappers around UUIDs so task and
//! event identifiers cannot be mixed up. Claim identifiers are different:
//! callers may supply their own (`CLM-001`, a policy system key, ...), so
//! [`ClaimId`] wraps a string and only generates one when none is given.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Batch processing identifiers
define_id!(TaskId, "TASK");

// Observer connection identifiers
define_id!(ConnectionId, "CONN");

/// Identifier of a submitted claim
///
/// Caller-supplied identifiers are kept verbatim (after trimming); claims
/// submitted without one receive a generated `CLM-<uuid>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClaimId(String);

impl ClaimId {
    /// Prefix used for generated identifiers
    pub const GENERATED_PREFIX: &'static str = "CLM";

    /// Wraps a caller-supplied identifier
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation("claim identifier must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generates a fresh, time-ordered identifier
    pub fn generate() -> Self {
        Self(format!("{}-{}", Self::GENERATED_PREFIX, Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClaimId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClaimId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_display() {
        let id = TaskId::new();
        let display = id.to_string();
        assert!(display.starts_with("TASK-"));
    }

    #[test]
    fn test_id_parsing() {
        let original = TaskId::new();
        let parsed: TaskId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_claim_id_trims_caller_value() {
        let id = ClaimId::new("  CLM-001 ").unwrap();
        assert_eq!(id.as_str(), "CLM-001");
    }

    #[test]
    fn test_claim_id_rejects_blank() {
        assert!(ClaimId::new("   ").is_err());
    }
}
