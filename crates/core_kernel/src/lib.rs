//! Core Kernel - Foundational types for the claim consensus engine
//!
//! This crate provides the building blocks shared by every other crate:
//! - Strongly-typed identifiers for tasks, connections and claims
//! - The kernel error type

pub mod identifiers;
pub mod error;

pub use identifiers::{TaskId, ConnectionId, ClaimId};
pub use error::CoreError;
