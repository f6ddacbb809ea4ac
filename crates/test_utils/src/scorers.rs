//! Scripted Scorer Adapters
//!
//! Deterministic [`ScorerAdapter`] doubles for driving the pipeline and job
//! manager into specific decisions, timeouts and failures, plus a progress
//! connector that drops connections on demand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use core_kernel::{ClaimId, TaskId};
use domain_claims::Claim;
use domain_scoring::{ScoreAssessment, ScorerAdapter, ScorerError};
use engine_batch::{ChannelError, ProgressConnector, ProgressMessage, ProgressStream};

/// Returns the same score for every claim
pub struct FixedScorer {
    id: String,
    score: f64,
    calls: AtomicUsize,
}

impl FixedScorer {
    pub fn new(id: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            score,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScorerAdapter for FixedScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        "test-1.0"
    }

    async fn evaluate(&self, _claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ScoreAssessment::new(self.score, format!("fixed score from {}", self.id)))
    }
}

/// Returns a per-claim score, falling back to a default
pub struct ScriptedScorer {
    id: String,
    scores: HashMap<ClaimId, f64>,
    default: f64,
    delay: Duration,
}

impl ScriptedScorer {
    pub fn new(id: impl Into<String>, default: f64) -> Self {
        Self {
            id: id.into(),
            scores: HashMap::new(),
            default,
            delay: Duration::ZERO,
        }
    }

    pub fn score(mut self, claim_id: &ClaimId, score: f64) -> Self {
        self.scores.insert(claim_id.clone(), score);
        self
    }

    /// Waits this long before answering
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ScorerAdapter for ScriptedScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        "test-1.0"
    }

    async fn evaluate(&self, claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let score = self.scores.get(&claim.id).copied().unwrap_or(self.default);
        Ok(ScoreAssessment::new(score, format!("scripted score from {}", self.id)))
    }
}

/// Never answers within any reasonable timeout
pub struct SlowScorer {
    id: String,
    delay: Duration,
}

impl SlowScorer {
    pub fn new(id: impl Into<String>, delay: Duration) -> Self {
        Self { id: id.into(), delay }
    }
}

#[async_trait]
impl ScorerAdapter for SlowScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        "test-1.0"
    }

    async fn evaluate(&self, _claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
        tokio::time::sleep(self.delay).await;
        Ok(ScoreAssessment::new(0.99, "answered too late"))
    }
}

/// Fails every call with the configured error kind
pub struct FailingScorer {
    id: String,
    invalid_input: bool,
}

impl FailingScorer {
    /// Fails with an upstream error
    pub fn upstream(id: impl Into<String>) -> Self {
        Self { id: id.into(), invalid_input: false }
    }

    /// Fails as if the claim lacked a required field
    pub fn invalid_input(id: impl Into<String>) -> Self {
        Self { id: id.into(), invalid_input: true }
    }
}

#[async_trait]
impl ScorerAdapter for FailingScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        "test-1.0"
    }

    async fn evaluate(&self, _claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
        if self.invalid_input {
            Err(ScorerError::invalid_input(&self.id, "narrative"))
        } else {
            Err(ScorerError::upstream(&self.id, "reasoning service returned 503"))
        }
    }
}

/// Panics inside `evaluate`
pub struct PanickingScorer {
    id: String,
}

impl PanickingScorer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl ScorerAdapter for PanickingScorer {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &str {
        "test-1.0"
    }

    async fn evaluate(&self, _claim: &Claim) -> Result<ScoreAssessment, ScorerError> {
        panic!("{} exploded", self.id)
    }
}

/// Shorthand for building a scorer list
pub fn scorers<const N: usize>(adapters: [Arc<dyn ScorerAdapter>; N]) -> Vec<Arc<dyn ScorerAdapter>> {
    adapters.into_iter().collect()
}

/// Wraps a connector and cuts the first `drops` connections after
/// `messages_per_connection` messages each
pub struct FlakyConnector<C> {
    inner: C,
    messages_per_connection: usize,
    drops_remaining: Arc<AtomicU32>,
    connects: Arc<AtomicU32>,
}

impl<C: ProgressConnector> FlakyConnector<C> {
    pub fn new(inner: C, messages_per_connection: usize, drops: u32) -> Self {
        Self {
            inner,
            messages_per_connection,
            drops_remaining: Arc::new(AtomicU32::new(drops)),
            connects: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: ProgressConnector> ProgressConnector for FlakyConnector<C> {
    async fn connect(&self, task_id: TaskId) -> Result<Box<dyn ProgressStream>, ChannelError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let stream = self.inner.connect(task_id).await?;
        let will_drop = self
            .drops_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(Box::new(FlakyStream {
            inner: stream,
            remaining: will_drop.then_some(self.messages_per_connection),
        }))
    }
}

struct FlakyStream {
    inner: Box<dyn ProgressStream>,
    remaining: Option<usize>,
}

#[async_trait]
impl ProgressStream for FlakyStream {
    async fn next_message(&mut self) -> Result<Option<ProgressMessage>, ChannelError> {
        match self.remaining {
            Some(0) => Err(ChannelError::disconnected("connection reset by test")),
            Some(ref mut n) => {
                *n -= 1;
                self.inner.next_message().await
            }
            None => self.inner.next_message().await,
        }
    }
}

/// Fails every connection attempt with a transient error
pub struct UnreachableConnector;

#[async_trait]
impl ProgressConnector for UnreachableConnector {
    async fn connect(&self, _task_id: TaskId) -> Result<Box<dyn ProgressStream>, ChannelError> {
        Err(ChannelError::disconnected("connection refused"))
    }
}
