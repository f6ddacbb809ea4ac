//! Engine configuration

use std::time::Duration;

use core_kernel::CoreError;
use domain_claims::ConsensusConfig;

/// Tuning knobs for the pipeline, job manager and progress channel
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Decision thresholds
    pub consensus: ConsensusConfig,
    /// Claims processed in parallel within one batch
    pub worker_pool_size: usize,
    /// Per-scorer call budget
    pub scorer_timeout: Duration,
    /// Interval between heartbeat messages on an idle channel
    pub heartbeat_interval: Duration,
    /// Largest accepted batch
    pub max_batch_size: usize,
    /// Buffered progress events per task before slow observers lag
    pub channel_capacity: usize,
    /// How long a finished task stays queryable before it is purged
    pub task_retention: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            consensus: ConsensusConfig::default(),
            worker_pool_size: 4,
            scorer_timeout: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(30),
            max_batch_size: 1000,
            channel_capacity: 64,
            task_retention: Duration::from_secs(3600),
        }
    }
}

impl EngineConfig {
    pub fn with_consensus(mut self, consensus: ConsensusConfig) -> Self {
        self.consensus = consensus;
        self
    }

    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    pub fn with_scorer_timeout(mut self, timeout: Duration) -> Self {
        self.scorer_timeout = timeout;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    pub fn with_task_retention(mut self, retention: Duration) -> Self {
        self.task_retention = retention;
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.consensus.validate()?;
        if self.worker_pool_size == 0 {
            return Err(CoreError::configuration("worker_pool_size must be at least 1"));
        }
        if self.scorer_timeout.is_zero() {
            return Err(CoreError::configuration("scorer_timeout must be positive"));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(CoreError::configuration("heartbeat_interval must be positive"));
        }
        if self.max_batch_size == 0 {
            return Err(CoreError::configuration("max_batch_size must be at least 1"));
        }
        if self.channel_capacity == 0 {
            return Err(CoreError::configuration("channel_capacity must be at least 1"));
        }
        if self.task_retention.is_zero() {
            return Err(CoreError::configuration("task_retention must be positive"));
        }
        Ok(())
    }
}
