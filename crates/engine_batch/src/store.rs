//! In-memory task store
//!
//! The job manager is the only writer; everyone else reads cloned snapshots,
//! so a reader never observes a half-applied update.
//!
//! Tasks live in memory only. Finished tasks are dropped once they are older
//! than the configured retention; running tasks are never removed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use core_kernel::{CoreError, TaskId};

use crate::error::BatchError;
use crate::task::BatchTask;

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, BatchTask>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn insert(&self, task: BatchTask) {
        self.tasks.write().await.insert(task.id, task);
    }

    /// Applies `f` to the task under the write lock
    pub(crate) async fn update<F, R>(&self, id: TaskId, f: F) -> Result<R, BatchError>
    where
        F: FnOnce(&mut BatchTask) -> Result<R, CoreError>,
    {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(&id).ok_or(BatchError::TaskNotFound(id))?;
        Ok(f(task)?)
    }

    /// Returns a copy of the task as it is right now
    pub async fn snapshot(&self, id: TaskId) -> Result<BatchTask, BatchError> {
        self.tasks
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BatchError::TaskNotFound(id))
    }

    /// Reads a projection of the task without cloning it whole
    pub async fn read<F, R>(&self, id: TaskId, f: F) -> Result<R, BatchError>
    where
        F: FnOnce(&BatchTask) -> R,
    {
        self.tasks
            .read()
            .await
            .get(&id)
            .map(f)
            .ok_or(BatchError::TaskNotFound(id))
    }

    /// Removes terminal tasks that finished before `cutoff`
    pub(crate) async fn remove_finished_before(&self, cutoff: DateTime<Utc>) -> Vec<TaskId> {
        let mut tasks = self.tasks.write().await;
        let expired: Vec<TaskId> = tasks
            .values()
            .filter(|t| t.state.is_terminal() && t.finished_at.is_some_and(|at| at < cutoff))
            .map(|t| t.id)
            .collect();
        for id in &expired {
            tasks.remove(id);
        }
        expired
    }

    pub async fn contains(&self, id: TaskId) -> bool {
        self.tasks.read().await.contains_key(&id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;
    use domain_claims::Claim;

    #[tokio::test]
    async fn test_snapshot_of_unknown_task() {
        let store = TaskStore::new();
        let id = TaskId::new();
        assert!(matches!(store.snapshot(id).await, Err(BatchError::TaskNotFound(found)) if found == id));
    }

    #[tokio::test]
    async fn test_update_maps_domain_errors() {
        let store = TaskStore::new();
        let task = BatchTask::new(TaskId::new(), vec![Claim::new("A", "B")]);
        let id = task.id;
        store.insert(task).await;

        store.update(id, |t| t.start()).await.unwrap();
        let again = store.update(id, |t| t.start()).await;
        assert!(matches!(again, Err(BatchError::InvalidState(_))));

        assert_eq!(store.read(id, |t| t.state).await.unwrap(), TaskState::Processing);
    }

    #[tokio::test]
    async fn test_only_finished_tasks_expire() {
        let store = TaskStore::new();
        let mut done = BatchTask::new(TaskId::new(), vec![Claim::new("A", "B")]);
        done.fail("no scorers configured").unwrap();
        let mut running = BatchTask::new(TaskId::new(), vec![Claim::new("C", "D")]);
        running.start().unwrap();
        let (done_id, running_id) = (done.id, running.id);
        store.insert(done).await;
        store.insert(running).await;

        let later = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.remove_finished_before(later).await, vec![done_id]);
        assert!(!store.contains(done_id).await);
        assert!(store.contains(running_id).await);
    }
}
