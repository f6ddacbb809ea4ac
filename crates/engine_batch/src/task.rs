//! Batch task aggregate

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CoreError, TaskId};
use domain_claims::{Claim, Decision};

/// Lifecycle state of a batch task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Accepted, not yet started
    Pending,
    /// Claims are being analyzed
    Processing,
    /// Every claim has an outcome
    Completed,
    /// The batch could not be processed
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Processing => "processing",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }

    fn can_transition_to(&self, target: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, target),
            (Pending, Processing) | (Pending, Failed) | (Processing, Completed) | (Processing, Failed)
        )
    }
}

/// Result slot for one claim in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimOutcome {
    Pending,
    Decided { decision: Decision },
    /// The pipeline itself failed for this claim
    Failed { reason: String },
}

impl ClaimOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, ClaimOutcome::Pending)
    }

    pub fn decision(&self) -> Option<&Decision> {
        match self {
            ClaimOutcome::Decided { decision } => Some(decision),
            _ => None,
        }
    }
}

/// A submitted batch and everything known about it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTask {
    pub id: TaskId,
    pub state: TaskState,
    /// Claims in submission order
    pub claims: Vec<Claim>,
    /// One slot per claim, aligned with `claims`
    pub outcomes: Vec<ClaimOutcome>,
    pub completed: usize,
    pub total: usize,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchTask {
    pub fn new(id: TaskId, claims: Vec<Claim>) -> Self {
        let total = claims.len();
        Self {
            id,
            state: TaskState::Pending,
            claims,
            outcomes: vec![ClaimOutcome::Pending; total],
            completed: 0,
            total,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) -> Result<(), CoreError> {
        self.transition(TaskState::Processing)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Fills the slot at `index` and returns the new completed count
    ///
    /// A slot is written once; outcomes are only accepted while processing.
    pub fn record(&mut self, index: usize, outcome: ClaimOutcome) -> Result<usize, CoreError> {
        if self.state != TaskState::Processing {
            return Err(CoreError::invalid_state(format!(
                "cannot record outcome for task {} in state {:?}",
                self.id, self.state
            )));
        }
        if outcome.is_pending() {
            return Err(CoreError::validation("pending is not an outcome"));
        }
        let slot = self
            .outcomes
            .get_mut(index)
            .ok_or_else(|| CoreError::validation(format!("claim index {} out of range", index)))?;
        if !slot.is_pending() {
            return Err(CoreError::invalid_state(format!(
                "outcome for claim index {} already recorded",
                index
            )));
        }
        *slot = outcome;
        self.completed += 1;
        Ok(self.completed)
    }

    pub fn complete(&mut self) -> Result<(), CoreError> {
        if self.completed != self.total {
            return Err(CoreError::invalid_state(format!(
                "task {} has {} of {} outcomes",
                self.id, self.completed, self.total
            )));
        }
        self.transition(TaskState::Completed)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), CoreError> {
        self.transition(TaskState::Failed)?;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Percentage complete; 100 is reserved for the completed state
    pub fn progress_percent(&self) -> u8 {
        match self.state {
            TaskState::Completed => 100,
            _ if self.total == 0 => 0,
            _ => ((self.completed * 100 / self.total) as u8).min(99),
        }
    }

    /// Wall time from start to finish, or to now while processing
    pub fn elapsed(&self) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self.finished_at.unwrap_or_else(Utc::now);
        (end - started).to_std().unwrap_or_default()
    }

    pub fn results(&self) -> BatchResults {
        BatchResults {
            task_id: self.id,
            state: self.state,
            partial: self.state != TaskState::Completed,
            completed: self.completed,
            total: self.total,
            outcomes: self.outcomes.clone(),
        }
    }

    fn transition(&mut self, target: TaskState) -> Result<(), CoreError> {
        if !self.state.can_transition_to(target) {
            return Err(CoreError::invalid_state(format!(
                "{:?} -> {:?}",
                self.state, target
            )));
        }
        self.state = target;
        Ok(())
    }
}

/// Per-claim outcomes of a task, in submission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    pub task_id: TaskId,
    pub state: TaskState,
    /// True until the task has completed
    pub partial: bool,
    pub completed: usize,
    pub total: usize,
    pub outcomes: Vec<ClaimOutcome>,
}

impl BatchResults {
    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.outcomes.iter().filter_map(ClaimOutcome::decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(n: usize) -> BatchTask {
        let claims = (0..n).map(|i| Claim::new(format!("Claimant {}", i), "Narrative")).collect();
        BatchTask::new(TaskId::new(), claims)
    }

    fn failed() -> ClaimOutcome {
        ClaimOutcome::Failed { reason: "boom".into() }
    }

    #[test]
    fn test_new_task_is_pending_with_empty_slots() {
        let task = task(3);
        assert_eq!(task.state, TaskState::Pending);
        assert_eq!(task.total, 3);
        assert!(task.outcomes.iter().all(ClaimOutcome::is_pending));
        assert_eq!(task.progress_percent(), 0);
    }

    #[test]
    fn test_record_requires_processing() {
        let mut task = task(1);
        assert!(task.record(0, failed()).is_err());
    }

    #[test]
    fn test_slot_is_written_once() {
        let mut task = task(2);
        task.start().unwrap();
        assert_eq!(task.record(1, failed()).unwrap(), 1);
        assert!(task.record(1, failed()).is_err());
        assert_eq!(task.completed, 1);
    }

    #[test]
    fn test_complete_requires_every_outcome() {
        let mut task = task(2);
        task.start().unwrap();
        task.record(0, failed()).unwrap();
        assert!(task.complete().is_err());
        task.record(1, failed()).unwrap();
        task.complete().unwrap();
        assert_eq!(task.progress_percent(), 100);
        assert!(!task.results().partial);
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut task = task(1);
        task.fail("no scorers").unwrap();
        assert!(task.start().is_err());
        assert!(task.fail("again").is_err());
        assert_eq!(task.error.as_deref(), Some("no scorers"));
    }

    #[test]
    fn test_progress_caps_below_completion() {
        let mut task = task(3);
        task.start().unwrap();
        for i in 0..3 {
            task.record(i, failed()).unwrap();
        }
        assert_eq!(task.progress_percent(), 99);
    }
}
