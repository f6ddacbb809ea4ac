//! Batch DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::TaskId;
use engine_batch::{BatchTask, TaskState};

use crate::dto::claims::ClaimRequest;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitBatchRequest {
    #[validate(nested)]
    pub claims: Vec<ClaimRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitBatchResponse {
    pub task_id: TaskId,
    pub status: TaskState,
    pub message: String,
    pub total_claims: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchStatusResponse {
    pub task_id: TaskId,
    pub status: TaskState,
    pub progress: u8,
    pub completed: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processing_time_secs: f64,
}

impl From<&BatchTask> for BatchStatusResponse {
    fn from(task: &BatchTask) -> Self {
        Self {
            task_id: task.id,
            status: task.state,
            progress: task.progress_percent(),
            completed: task.completed,
            total: task.total,
            error: task.error.clone(),
            created_at: task.created_at,
            started_at: task.started_at,
            finished_at: task.finished_at,
            processing_time_secs: task.elapsed().as_secs_f64(),
        }
    }
}
