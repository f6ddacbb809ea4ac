//! Batch engine errors

use thiserror::Error;

use core_kernel::{CoreError, TaskId};
use domain_claims::ClaimError;

/// Errors returned by the batch job manager
#[derive(Debug, Error)]
pub enum BatchError {
    /// Structurally invalid submission; no task is created
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Invalid claim: {0}")]
    InvalidClaim(#[from] ClaimError),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Invalid task state: {0}")]
    InvalidState(#[from] CoreError),
}

impl BatchError {
    pub fn invalid_batch(message: impl Into<String>) -> Self {
        BatchError::InvalidBatch(message.into())
    }
}

/// Errors seen by progress observers
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// Transient; the observer should reconnect
    #[error("Channel disconnected: {0}")]
    ChannelDisconnected(String),

    #[error("Gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    #[error("Connection closed by the observer")]
    ClosedByObserver,
}

impl ChannelError {
    pub fn disconnected(message: impl Into<String>) -> Self {
        ChannelError::ChannelDisconnected(message.into())
    }

    /// Returns true if a reconnect attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ChannelError::ChannelDisconnected(_))
    }
}
