//! # Request Log API Handlers

use crate::error::ApiError;
use crate::server::AppState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurgeResponse {
    /// Number of expired entries deleted
    pub deleted: u64,
}

/// Deletes request log entries past their deletion date
#[utoipa::path(
    post,
    path = "/logs/purge",
    responses(
        (status = 200, description = "Purge completed", body = PurgeResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "logs"
)]
pub async fn purge_logs(State(state): State<AppState>) -> Result<Json<PurgeResponse>, ApiError> {
    let deleted = state.gateway.logs().purge_expired().await?;
    tracing::info!(deleted, "manual request log purge completed");

    Ok(Json(PurgeResponse { deleted }))
}
