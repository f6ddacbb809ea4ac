//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! claim consensus test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built claims and engine settings
//! - `builders`: Builder patterns for claims and wired-up engines
//! - `scorers`: Scripted scorer adapters and a flaky progress connector
//! - `assertions`: Custom assertion helpers for decisions and progress streams
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod scorers;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use scorers::*;
pub use assertions::*;
pub use generators::*;
