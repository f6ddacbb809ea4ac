//! Batch handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::TaskId;
use engine_batch::{BatchResults, TaskState};

use crate::dto::batches::*;
use crate::dto::claims::ClaimRequest;
use crate::{error::ApiError, AppState};

/// Accepts a batch for background processing
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<SubmitBatchRequest>,
) -> Result<(StatusCode, Json<SubmitBatchResponse>), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Invalid batch: {}", e)))?;

    let claims = request
        .claims
        .into_iter()
        .map(ClaimRequest::into_claim)
        .collect::<Result<Vec<_>, _>>()?;
    let total_claims = claims.len();

    let task_id = state.manager.submit(claims).await?;
    info!(task_id = %task_id, total_claims, "Batch accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitBatchResponse {
            task_id,
            status: TaskState::Pending,
            message: format!("Processing {} claims", total_claims),
            total_claims,
        }),
    ))
}

/// Gets the lifecycle state of a batch
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BatchStatusResponse>, ApiError> {
    let task_id = parse_task_id(&id)?;
    let task = state.manager.status(task_id).await?;
    Ok(Json(BatchStatusResponse::from(&task)))
}

/// Gets per-claim outcomes, partial until the batch is terminal
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BatchResults>, ApiError> {
    let task_id = parse_task_id(&id)?;
    Ok(Json(state.manager.results(task_id).await?))
}

/// Accepts both the bare UUID and the prefixed display form
pub(crate) fn parse_task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("Task not found: {}", raw)))
}
