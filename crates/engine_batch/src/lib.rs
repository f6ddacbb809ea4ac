//! Batch Engine
//!
//! Runs claims through the scorer fan-out and consensus engine, one at a time
//! or in batches, and reports batch progress to any number of observers.
//!
//! # Components
//!
//! - [`ClaimPipeline`]: scorer fan-out, timeouts, sentinel results, consensus
//! - [`BatchJobManager`]: task lifecycle and the bounded worker pool
//! - [`ProgressHub`] / [`ProgressSubscription`]: the progress channel
//! - [`ProgressObserver`]: client-side reconnection with backoff
//!
//! # Example
//!
//! ```rust,ignore
//! let manager = BatchJobManager::new(scorers, EngineConfig::default())?;
//! let task_id = manager.submit(claims).await?;
//!
//! let mut progress = manager.subscribe(task_id).await?;
//! while let Some(message) = progress.next().await {
//!     println!("{}", serde_json::to_string(&message)?);
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod stats;
pub mod task;
pub mod store;
pub mod progress;
pub mod observer;
pub mod manager;

pub use config::EngineConfig;
pub use error::{BatchError, ChannelError};
pub use pipeline::ClaimPipeline;
pub use stats::{DecisionSummary, StatsSnapshot};
pub use task::{BatchResults, BatchTask, ClaimOutcome, TaskState};
pub use store::TaskStore;
pub use progress::{CompletedCount, ProgressHub, ProgressMessage, ProgressStream, ProgressSubscription};
pub use observer::{
    BackoffStrategy, ConnectionState, ObservationSummary, ObserverCloser, ProgressConnector, ProgressObserver,
    ReconnectPolicy, ReconnectTracker,
};
pub use manager::BatchJobManager;
