//! Batch Job Manager
//!
//! Accepts batches of claims, runs them through the [`ClaimPipeline`] on a
//! bounded worker pool and publishes progress as each claim resolves.
//!
//! # Processing a batch
//!
//! ```text
//! submit ──▶ PENDING ──driver──▶ PROCESSING ──all outcomes──▶ COMPLETED
//!                 │                   │
//!                 └── no scorers ─────┴── driver crash ──▶ FAILED
//! ```
//!
//! Claims are dispatched in submission order; at most `worker_pool_size`
//! pipeline runs are in flight at once. Outcomes may land in any order but
//! each is written to its own slot, so results keep submission order.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, instrument, warn};

use core_kernel::{CoreError, TaskId};
use domain_claims::{Claim, ConsensusEngine, Decision};
use domain_scoring::ScorerAdapter;

use crate::config::EngineConfig;
use crate::error::{BatchError, ChannelError};
use crate::observer::ProgressConnector;
use crate::pipeline::ClaimPipeline;
use crate::progress::{ProgressHub, ProgressMessage, ProgressStream, ProgressSubscription};
use crate::stats::StatsSnapshot;
use crate::store::TaskStore;
use crate::task::{BatchResults, BatchTask, ClaimOutcome};

struct ManagerInner {
    pipeline: Arc<ClaimPipeline>,
    store: TaskStore,
    progress: ProgressHub,
    config: EngineConfig,
}

/// Owns every batch task and the workers processing them
///
/// Cheap to clone; clones share the same tasks.
#[derive(Clone)]
pub struct BatchJobManager {
    inner: Arc<ManagerInner>,
}

impl BatchJobManager {
    /// Builds the pipeline over `scorers` with the consensus settings and
    /// scorer timeout taken from `config`
    pub fn new(scorers: Vec<Arc<dyn ScorerAdapter>>, config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let engine = ConsensusEngine::new(config.consensus)?;
        let pipeline = ClaimPipeline::new(scorers, engine, config.scorer_timeout)?;
        let progress = ProgressHub::new(config.channel_capacity, config.heartbeat_interval);
        Ok(Self {
            inner: Arc::new(ManagerInner {
                pipeline: Arc::new(pipeline),
                store: TaskStore::new(),
                progress,
                config,
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn pipeline(&self) -> &ClaimPipeline {
        &self.inner.pipeline
    }

    pub fn progress(&self) -> &ProgressHub {
        &self.inner.progress
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.pipeline.stats()
    }

    /// Analyzes a single claim outside any batch
    #[instrument(skip(self, claim), fields(claim_id = %claim.id))]
    pub async fn analyze(&self, claim: Claim) -> Result<Decision, BatchError> {
        claim.validate()?;
        if self.inner.pipeline.scorer_count() == 0 {
            return Err(BatchError::InvalidState(CoreError::configuration(
                "no scorers configured",
            )));
        }
        Ok(self.inner.pipeline.run(Arc::new(claim)).await)
    }

    /// Accepts a batch and starts processing it in the background
    ///
    /// Returns as soon as the task exists; nothing is created for a rejected
    /// batch.
    pub async fn submit(&self, claims: Vec<Claim>) -> Result<TaskId, BatchError> {
        self.validate_batch(&claims)?;
        self.purge_finished().await;

        let task_id = TaskId::new();
        let shared: Vec<Arc<Claim>> = claims.iter().cloned().map(Arc::new).collect();
        let total = claims.len();

        self.inner.progress.open(task_id);
        self.inner.store.insert(BatchTask::new(task_id, claims)).await;
        info!(task_id = %task_id, total, "Batch accepted");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(panic) = AssertUnwindSafe(drive(Arc::clone(&inner), task_id, shared))
                .catch_unwind()
                .await
            {
                let reason = panic_message(panic.as_ref());
                error!(task_id = %task_id, reason = %reason, "Batch driver crashed");
                fail_task(&inner, task_id, format!("batch processing crashed: {}", reason)).await;
            }
        });

        Ok(task_id)
    }

    /// Forgets finished tasks older than the configured retention
    ///
    /// Runs on every submit, so memory stays bounded by the tasks finished
    /// within one retention window plus those still running.
    pub async fn purge_finished(&self) -> usize {
        let Ok(retention) = chrono::Duration::from_std(self.inner.config.task_retention) else {
            return 0;
        };
        let cutoff = Utc::now() - retention;
        let expired = self.inner.store.remove_finished_before(cutoff).await;
        for task_id in &expired {
            self.inner.progress.close(*task_id);
        }
        if !expired.is_empty() {
            info!(purged = expired.len(), "Purged finished tasks");
        }
        expired.len()
    }

    pub async fn status(&self, task_id: TaskId) -> Result<BatchTask, BatchError> {
        self.inner.store.snapshot(task_id).await
    }

    /// Outcomes so far; `partial` until the task completes
    pub async fn results(&self, task_id: TaskId) -> Result<BatchResults, BatchError> {
        self.inner.store.read(task_id, BatchTask::results).await
    }

    /// Opens a progress connection, starting with the task's current state
    pub async fn subscribe(&self, task_id: TaskId) -> Result<ProgressSubscription, ChannelError> {
        let receiver = self
            .inner
            .progress
            .receiver(task_id)
            .ok_or(ChannelError::TaskNotFound(task_id))?;
        let snapshot = self
            .inner
            .store
            .read(task_id, ProgressMessage::snapshot)
            .await
            .map_err(|_| ChannelError::TaskNotFound(task_id))?;
        Ok(ProgressSubscription::new(
            receiver,
            snapshot,
            self.inner.progress.heartbeat_interval(),
        ))
    }

    /// Waits until the task is completed or failed and returns it
    pub async fn wait_for_completion(&self, task_id: TaskId) -> Result<BatchTask, BatchError> {
        let mut subscription = self
            .subscribe(task_id)
            .await
            .map_err(|_| BatchError::TaskNotFound(task_id))?;
        while let Some(message) = subscription.next().await {
            if message.is_terminal() {
                break;
            }
        }
        self.status(task_id).await
    }

    fn validate_batch(&self, claims: &[Claim]) -> Result<(), BatchError> {
        if claims.is_empty() {
            return Err(BatchError::invalid_batch("batch contains no claims"));
        }
        let max = self.inner.config.max_batch_size;
        if claims.len() > max {
            return Err(BatchError::invalid_batch(format!(
                "batch of {} claims exceeds the limit of {}",
                claims.len(),
                max
            )));
        }
        let mut seen = HashSet::new();
        for (index, claim) in claims.iter().enumerate() {
            if !seen.insert(&claim.id) {
                return Err(BatchError::invalid_batch(format!("duplicate claim id {}", claim.id)));
            }
            claim
                .validate()
                .map_err(|e| BatchError::invalid_batch(format!("claim {} ({}): {}", index, claim.id, e)))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BatchJobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchJobManager")
            .field("pipeline", &self.inner.pipeline)
            .field("config", &self.inner.config)
            .finish()
    }
}

#[async_trait]
impl ProgressConnector for BatchJobManager {
    async fn connect(&self, task_id: TaskId) -> Result<Box<dyn ProgressStream>, ChannelError> {
        Ok(Box::new(self.subscribe(task_id).await?))
    }
}

#[instrument(skip(inner, claims), fields(total = claims.len()))]
async fn drive(inner: Arc<ManagerInner>, task_id: TaskId, claims: Vec<Arc<Claim>>) {
    let started = Instant::now();
    let total = claims.len();

    if inner.pipeline.scorer_count() == 0 {
        fail_task(&inner, task_id, "no scorers configured").await;
        return;
    }
    if let Err(e) = inner.store.update(task_id, |t| t.start()).await {
        error!(task_id = %task_id, error = %e, "Could not start batch");
        return;
    }
    inner.progress.publish(ProgressMessage::progress(
        task_id,
        "starting",
        0,
        "Initializing batch processing...",
        0,
        total,
    ));

    let (results_tx, mut results_rx) = mpsc::unbounded_channel::<(usize, ClaimOutcome)>();
    let dispatcher = tokio::spawn(dispatch(
        Arc::clone(&inner.pipeline),
        claims,
        inner.config.worker_pool_size,
        results_tx,
    ));

    let mut received = 0;
    while let Some((index, outcome)) = results_rx.recv().await {
        received += 1;
        let claim_label = describe(&outcome);
        let recorded = inner
            .store
            .update(task_id, |t| {
                let completed = t.record(index, outcome)?;
                Ok((completed, t.progress_percent()))
            })
            .await;
        match recorded {
            Ok((completed, percent)) => {
                inner.progress.publish(ProgressMessage::progress(
                    task_id,
                    "processing",
                    percent,
                    format!("Processed claim {}/{} ({})", completed, total, claim_label),
                    completed,
                    total,
                ));
            }
            Err(e) => warn!(task_id = %task_id, index, error = %e, "Discarding outcome"),
        }
    }

    if let Err(e) = dispatcher.await {
        fail_task(&inner, task_id, format!("claim dispatch aborted: {}", e)).await;
        return;
    }
    if received != total {
        fail_task(&inner, task_id, format!("{} of {} claims never resolved", total - received, total)).await;
        return;
    }

    match inner.store.update(task_id, |t| t.complete()).await {
        Ok(()) => {
            let elapsed = started.elapsed();
            info!(task_id = %task_id, total, elapsed_ms = elapsed.as_millis() as u64, "Batch completed");
            inner.progress.publish(ProgressMessage::completed(task_id, total, elapsed));
        }
        Err(e) => fail_task(&inner, task_id, e.to_string()).await,
    }
}

/// Starts one pipeline run per claim, in order, never more than `pool_size` at once
async fn dispatch(
    pipeline: Arc<ClaimPipeline>,
    claims: Vec<Arc<Claim>>,
    pool_size: usize,
    results: mpsc::UnboundedSender<(usize, ClaimOutcome)>,
) {
    let permits = Arc::new(Semaphore::new(pool_size));
    for (index, claim) in claims.into_iter().enumerate() {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            return;
        };
        let pipeline = Arc::clone(&pipeline);
        let results = results.clone();
        tokio::spawn(async move {
            let claim_id = claim.id.clone();
            let outcome = match AssertUnwindSafe(pipeline.run(claim)).catch_unwind().await {
                Ok(decision) => ClaimOutcome::Decided { decision },
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    error!(claim_id = %claim_id, reason = %reason, "Claim pipeline crashed");
                    ClaimOutcome::Failed {
                        reason: format!("analysis failed: {}", reason),
                    }
                }
            };
            drop(permit);
            // The driver only goes away if it crashed, in which case the task is failed anyway
            let _ = results.send((index, outcome));
        });
    }
}

async fn fail_task(inner: &ManagerInner, task_id: TaskId, reason: impl Into<String>) {
    let reason = reason.into();
    match inner.store.update(task_id, |t| t.fail(reason.clone())).await {
        Ok(()) => {
            warn!(task_id = %task_id, reason = %reason, "Batch failed");
            inner.progress.publish(ProgressMessage::error(task_id, reason));
        }
        Err(e) => error!(task_id = %task_id, error = %e, "Could not mark batch failed"),
    }
}

fn describe(outcome: &ClaimOutcome) -> String {
    match outcome {
        ClaimOutcome::Decided { decision } => format!("{}: {}", decision.claim_id, decision.label),
        ClaimOutcome::Failed { reason } => format!("failed: {}", reason),
        ClaimOutcome::Pending => "pending".to_string(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use domain_claims::ConsensusConfig;

    fn manager_without_scorers() -> BatchJobManager {
        BatchJobManager::new(vec![], EngineConfig::default().with_max_batch_size(2)).unwrap()
    }

    #[test]
    fn test_pipeline_follows_engine_config() {
        let consensus = ConsensusConfig {
            fraud_threshold: 0.5,
            consensus_threshold: 1,
        };
        let config = EngineConfig::default()
            .with_consensus(consensus)
            .with_scorer_timeout(Duration::from_millis(250));

        let manager = BatchJobManager::new(vec![], config).unwrap();

        assert_eq!(manager.pipeline().engine().config(), &consensus);
        assert_eq!(manager.pipeline().scorer_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_consensus_is_rejected() {
        let config = EngineConfig::default().with_consensus(ConsensusConfig {
            fraud_threshold: 1.5,
            consensus_threshold: 3,
        });
        assert!(matches!(
            BatchJobManager::new(vec![], config),
            Err(CoreError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_batches_create_no_task() {
        let manager = manager_without_scorers();

        assert!(matches!(manager.submit(vec![]).await, Err(BatchError::InvalidBatch(_))));

        let too_many = vec![Claim::new("A", "a"), Claim::new("B", "b"), Claim::new("C", "c")];
        assert!(matches!(manager.submit(too_many).await, Err(BatchError::InvalidBatch(_))));

        let claim = Claim::new("A", "a");
        let duplicate = vec![claim.clone(), claim];
        assert!(matches!(manager.submit(duplicate).await, Err(BatchError::InvalidBatch(_))));

        assert!(manager.inner.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_no_scorers_fails_the_task() {
        let manager = manager_without_scorers();
        let task_id = manager.submit(vec![Claim::new("A", "a")]).await.unwrap();

        let task = manager.wait_for_completion(task_id).await.unwrap();
        assert_eq!(task.state, crate::task::TaskState::Failed);
        assert_eq!(task.error.as_deref(), Some("no scorers configured"));
    }

    #[tokio::test]
    async fn test_analyze_without_scorers_is_an_error() {
        let manager = manager_without_scorers();
        assert!(manager.analyze(Claim::new("A", "a")).await.is_err());
    }

    #[tokio::test]
    async fn test_finished_tasks_expire_after_retention() {
        let manager = BatchJobManager::new(
            vec![],
            EngineConfig::default().with_task_retention(Duration::from_millis(10)),
        )
        .unwrap();
        let first = manager.submit(vec![Claim::new("A", "a")]).await.unwrap();
        manager.wait_for_completion(first).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = manager.submit(vec![Claim::new("B", "b")]).await.unwrap();

        assert!(matches!(manager.status(first).await, Err(BatchError::TaskNotFound(_))));
        assert!(matches!(manager.subscribe(first).await, Err(ChannelError::TaskNotFound(_))));
        assert!(manager.status(second).await.is_ok());
    }

    #[test]
    fn test_panic_message() {
        let panic: Box<dyn std::any::Any + Send> = Box::new("scorer exploded");
        assert_eq!(panic_message(panic.as_ref()), "scorer exploded");
    }
}
