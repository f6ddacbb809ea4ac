//! Request handlers

pub mod health;
pub mod claims;
pub mod batches;
pub mod stats;
pub mod progress;
