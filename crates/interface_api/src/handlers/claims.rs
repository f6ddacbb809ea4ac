//! Claims handlers

use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Runs one claim through the pipeline and returns the decision
pub async fn analyze_claim(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    request.validate()?;
    let claim = request.into_claim()?;
    let claim_id = claim.id.clone();

    let decision = state.manager.analyze(claim).await?;
    info!(
        claim_id = %claim_id,
        label = %decision.label,
        confidence = decision.confidence,
        "Claim analyzed"
    );

    Ok(Json(AnalysisResponse { claim_id, decision }))
}
