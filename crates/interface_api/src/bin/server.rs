//! Fraud Consensus - API Server Binary
//!
//! Starts the HTTP and WebSocket server with the rule-based scorer set.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin fraud-consensus-server
//!
//! # Run with environment variables
//! FRAUD_PORT=9000 FRAUD_WORKER_POOL_SIZE=8 cargo run --bin fraud-consensus-server
//! ```
//!
//! # Environment Variables
//!
//! * `FRAUD_HOST` - Server host (default: 0.0.0.0)
//! * `FRAUD_PORT` - Server port (default: 8080)
//! * `FRAUD_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `FRAUD_FRAUD_THRESHOLD` - Minimum high-risk score (default: 0.7)
//! * `FRAUD_CONSENSUS_THRESHOLD` - High-risk scores needed to reject (default: 3)
//! * `FRAUD_WORKER_POOL_SIZE` - Claims analyzed in parallel (default: 4)
//! * `FRAUD_SCORER_TIMEOUT_SECS` - Per-scorer budget (default: 30)
//! * `FRAUD_HEARTBEAT_INTERVAL_SECS` - Idle heartbeat period (default: 30)
//! * `FRAUD_MAX_BATCH_SIZE` - Largest accepted batch (default: 1000)
//! * `FRAUD_TASK_RETENTION_SECS` - How long finished batches are kept (default: 3600)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_scoring::{RuleBasedScorer, ScorerAdapter};
use engine_batch::BatchJobManager;
use interface_api::{config::ServiceConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ServiceConfig::from_env().context("loading configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        fraud_threshold = config.fraud_threshold,
        consensus_threshold = config.consensus_threshold,
        worker_pool_size = config.worker_pool_size,
        "Starting fraud consensus server"
    );

    let manager = build_manager(&config)?;
    let app = create_router(manager, config.clone());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wires the rule-based scorers into the job manager
fn build_manager(config: &ServiceConfig) -> anyhow::Result<BatchJobManager> {
    let engine_config = config.engine_config();
    engine_config.validate().context("invalid engine configuration")?;

    let scorers: Vec<Arc<dyn ScorerAdapter>> = RuleBasedScorer::full_set()
        .into_iter()
        .map(|scorer| Arc::new(scorer) as Arc<dyn ScorerAdapter>)
        .collect();
    tracing::info!(scorers = scorers.len(), "Scorers configured");

    Ok(BatchJobManager::new(scorers, engine_config)?)
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests finish before the process exits; running batches are
/// abandoned with it.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
