//! # Log Source API Handlers

use crate::error::{ApiError, not_found};
use crate::models::http_request_log_source::{self, LogSourceSettings};
use crate::repositories::LogSourceRepository;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Log source configuration for API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogSourceInfo {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub sequence: i32,
    pub is_log_enabled: bool,
    /// Days entries are kept; 0 keeps them forever
    pub log_retention_period: i32,
    /// Inline body limit in KB
    pub body_text_log_limit: i32,
    pub content_type: String,
}

impl From<http_request_log_source::Model> for LogSourceInfo {
    fn from(model: http_request_log_source::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            active: model.active,
            sequence: model.sequence,
            is_log_enabled: model.is_log_enabled,
            log_retention_period: model.log_retention_period,
            body_text_log_limit: model.body_text_log_limit,
            content_type: model.content_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogSourcesResponse {
    pub log_sources: Vec<LogSourceInfo>,
}

/// Lists log sources ordered by sequence and name
#[utoipa::path(
    get,
    path = "/log-sources",
    responses(
        (status = 200, description = "All log sources", body = LogSourcesResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "log-sources"
)]
pub async fn list_log_sources(
    State(state): State<AppState>,
) -> Result<Json<LogSourcesResponse>, ApiError> {
    let log_sources = LogSourceRepository::new(state.db.clone())
        .list_all()
        .await?
        .into_iter()
        .map(LogSourceInfo::from)
        .collect();

    Ok(Json(LogSourcesResponse { log_sources }))
}

/// Applies a partial settings update to a log source
#[utoipa::path(
    patch,
    path = "/log-sources/{id}",
    params(("id" = String, Path, description = "Log source id")),
    request_body(content = LogSourceSettings, example = json!({
        "log_retention_period": 30,
        "body_text_log_limit": 10
    })),
    responses(
        (status = 200, description = "Updated log source", body = LogSourceInfo),
        (status = 400, description = "Invalid settings", body = ApiError),
        (status = 404, description = "Unknown log source", body = ApiError)
    ),
    tag = "log-sources"
)]
pub async fn update_log_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(settings): Json<LogSourceSettings>,
) -> Result<Json<LogSourceInfo>, ApiError> {
    settings.validate()?;

    let repo = LogSourceRepository::new(state.db.clone());
    if repo.find_by_id(id).await?.is_none() {
        return Err(not_found(&format!("Log source '{}' not found", id)));
    }

    let updated = repo.update_settings(id, settings).await?;
    tracing::info!(log_source = %updated.name, "log source settings updated");

    Ok(Json(LogSourceInfo::from(updated)))
}
