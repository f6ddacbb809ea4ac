//! Request/response data transfer objects

pub mod claims;
pub mod batches;
pub mod stats;
