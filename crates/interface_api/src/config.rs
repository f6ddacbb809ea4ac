//! Service configuration

use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use domain_claims::ConsensusConfig;
use engine_batch::EngineConfig;

/// Service configuration
///
/// Every key can be overridden with a `FRAUD_`-prefixed environment
/// variable, e.g. `FRAUD_PORT=9000` or `FRAUD_WORKER_POOL_SIZE=8`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// Minimum score considered high risk
    pub fraud_threshold: f64,
    /// High-risk scores required to reject
    pub consensus_threshold: usize,
    /// Claims analyzed in parallel per batch
    pub worker_pool_size: usize,
    /// Per-scorer call budget
    pub scorer_timeout_secs: u64,
    /// Heartbeat period on idle progress connections
    pub heartbeat_interval_secs: u64,
    /// Largest accepted batch
    pub max_batch_size: usize,
    /// How long finished batches stay queryable
    pub task_retention_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            fraud_threshold: 0.7,
            consensus_threshold: 3,
            worker_pool_size: 4,
            scorer_timeout_secs: 30,
            heartbeat_interval_secs: 30,
            max_batch_size: 1000,
            task_retention_secs: 3600,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from environment, over the built-in defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("log_level", defaults.log_level)?
            .set_default("fraud_threshold", defaults.fraud_threshold)?
            .set_default("consensus_threshold", defaults.consensus_threshold as i64)?
            .set_default("worker_pool_size", defaults.worker_pool_size as i64)?
            .set_default("scorer_timeout_secs", defaults.scorer_timeout_secs as i64)?
            .set_default("heartbeat_interval_secs", defaults.heartbeat_interval_secs as i64)?
            .set_default("max_batch_size", defaults.max_batch_size as i64)?
            .set_default("task_retention_secs", defaults.task_retention_secs as i64)?
            .add_source(Environment::with_prefix("FRAUD").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn consensus(&self) -> ConsensusConfig {
        ConsensusConfig {
            fraud_threshold: self.fraud_threshold,
            consensus_threshold: self.consensus_threshold,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_consensus(self.consensus())
            .with_worker_pool_size(self.worker_pool_size)
            .with_scorer_timeout(Duration::from_secs(self.scorer_timeout_secs))
            .with_heartbeat_interval(Duration::from_secs(self.heartbeat_interval_secs))
            .with_max_batch_size(self.max_batch_size)
            .with_task_retention(Duration::from_secs(self.task_retention_secs))
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_onto_engine_config() {
        let config = ServiceConfig::default();
        let engine = config.engine_config();

        assert_eq!(engine.consensus, ConsensusConfig::default());
        assert_eq!(engine.worker_pool_size, 4);
        assert_eq!(engine.scorer_timeout, Duration::from_secs(30));
        assert_eq!(engine.max_batch_size, 1000);
        assert_eq!(engine.task_retention, Duration::from_secs(3600));
        assert!(engine.validate().is_ok());
    }

    #[test]
    fn test_server_addr() {
        let config = ServiceConfig {
            port: 9000,
            ..ServiceConfig::default()
        };
        assert_eq!(config.server_addr(), "0.0.0.0:9000");
    }
}
