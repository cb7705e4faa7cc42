//! # Connectors API Handlers

use crate::connectors::Operation;
use crate::error::{ApiError, not_found, validation_error};
use crate::models::api_connector;
use crate::repositories::{ConnectorInUse, ConnectorRepository};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

/// Connector information for API responses
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectorInfo {
    #[schema(value_type = String)]
    pub id: Uuid,
    /// Stable code used to resolve overrides (e.g. "loopback")
    pub code: String,
    pub display_name: Option<String>,
    /// Base URL requests are resolved against
    pub api_url: String,
    pub is_api_token_used: bool,
    pub is_api_token_static: bool,
    /// Pipeline steps this connector overrides
    pub overrides: Vec<Operation>,
}

impl ConnectorInfo {
    fn new(model: api_connector::Model, overrides: Vec<Operation>) -> Self {
        Self {
            id: model.id,
            code: model.code,
            display_name: model.display_name,
            api_url: model.api_url,
            is_api_token_used: model.is_api_token_used,
            is_api_token_static: model.is_api_token_static,
            overrides,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectorsResponse {
    pub connectors: Vec<ConnectorInfo>,
}

/// Update payload for a connector's base URL
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateConnectorRequest {
    pub api_url: String,
}

/// Lists configured connectors together with their registered overrides
#[utoipa::path(
    get,
    path = "/connectors",
    responses(
        (status = 200, description = "Configured connectors", body = ConnectorsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn list_connectors(
    State(state): State<AppState>,
) -> Result<Json<ConnectorsResponse>, ApiError> {
    let repo = ConnectorRepository::new(state.db.clone());
    let registry = state.gateway.registry();

    let connectors = repo
        .list_all()
        .await?
        .into_iter()
        .map(|model| {
            let overrides = registry.overrides_for(&model.code);
            ConnectorInfo::new(model, overrides)
        })
        .collect();

    Ok(Json(ConnectorsResponse { connectors }))
}

/// Changes a connector's base URL
///
/// Rejected with 409 while an active credential uses the connector.
#[utoipa::path(
    patch,
    path = "/connectors/{id}",
    params(("id" = String, Path, description = "Connector id")),
    request_body = UpdateConnectorRequest,
    responses(
        (status = 200, description = "Updated connector", body = ConnectorInfo),
        (status = 400, description = "Invalid URL", body = ApiError),
        (status = 404, description = "Unknown connector", body = ApiError),
        (status = 409, description = "Connector in use", body = ApiError)
    ),
    tag = "connectors"
)]
pub async fn update_connector(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateConnectorRequest>,
) -> Result<Json<ConnectorInfo>, ApiError> {
    if let Err(error) = Url::parse(&body.api_url) {
        return Err(validation_error(
            "Invalid connector URL",
            json!({"api_url": error.to_string()}),
        ));
    }

    let repo = ConnectorRepository::new(state.db.clone());
    if repo.find_by_id(id).await?.is_none() {
        return Err(not_found(&format!("Connector '{}' not found", id)));
    }

    let updated = repo
        .update_api_url(id, &body.api_url)
        .await
        .map_err(|error| match error.downcast::<ConnectorInUse>() {
            Ok(in_use) => ApiError::from(in_use),
            Err(other) => ApiError::from(other),
        })?;

    let overrides = state.gateway.registry().overrides_for(&updated.code);
    Ok(Json(ConnectorInfo::new(updated, overrides)))
}
