//! # Credentials API Handlers
//!
//! Credential listing, activation, request log browsing and ad-hoc calls
//! through the request gateway.

use crate::error::{ApiError, not_found, validation_error};
use crate::gateway::{ApiRequest, StringMap};
use crate::models::api_credential::ApiCredential;
use crate::models::http_request_log;
use crate::repositories::CredentialRepository;
use crate::request_log::LogSourceOwner;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_LOG_LIMIT: u64 = 50;
const MAX_LOG_LIMIT: u64 = 200;

/// Credential information for API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialInfo {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    #[schema(value_type = Option<String>)]
    pub tenant_id: Option<Uuid>,
    /// Code of the connector the credential talks to
    pub connector_code: String,
    #[schema(value_type = String)]
    pub log_source_id: Uuid,
}

impl From<&ApiCredential> for CredentialInfo {
    fn from(credential: &ApiCredential) -> Self {
        Self {
            id: credential.credential.id,
            name: credential.credential.name.clone(),
            active: credential.credential.active,
            tenant_id: credential.credential.tenant_id,
            connector_code: credential.code().to_string(),
            log_source_id: credential.log_source_id(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialsResponse {
    pub credentials: Vec<CredentialInfo>,
}

/// Activation toggle payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCredentialRequest {
    pub active: bool,
}

/// Query parameters for log listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListLogsQuery {
    /// Maximum number of entries to return (default: 50, max: 200)
    pub limit: Option<u64>,
}

/// A request log entry as stored; spilled bodies are base64 in the `*_file` fields
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogEntryInfo {
    #[schema(value_type = String)]
    pub id: Uuid,
    /// Target URL
    pub name: String,
    pub method: Option<String>,
    pub headers: Option<String>,
    pub params: Option<String>,
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body_file: Option<String>,
    pub code: Option<String>,
    pub response_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body_file: Option<String>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_file: Option<String>,
    #[schema(value_type = Option<String>)]
    pub delete_by_date: Option<NaiveDate>,
    pub created_at: String,
    pub processed_at: Option<String>,
    pub processing_seconds: i32,
}

impl From<http_request_log::Model> for LogEntryInfo {
    fn from(model: http_request_log::Model) -> Self {
        Self {
            request_body_file: model.request_body_file_base64(),
            response_body_file: model.response_body_file_base64(),
            error_file: model.error_file_base64(),
            id: model.id,
            name: model.name,
            method: model.method,
            headers: model.headers,
            params: model.params,
            request_body: model.request_body,
            code: model.code,
            response_body: model.response_body,
            error: model.error,
            delete_by_date: model.delete_by_date,
            created_at: model.created_at.to_rfc3339(),
            processed_at: model.processed_at.map(|at| at.to_rfc3339()),
            processing_seconds: model.processing_seconds,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogEntriesResponse {
    pub logs: Vec<LogEntryInfo>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_silent() -> bool {
    true
}

/// A call to perform through the gateway on behalf of a credential
#[derive(Debug, Deserialize, ToSchema)]
pub struct CallRequest {
    /// HTTP method (default: GET)
    #[serde(default = "default_method")]
    pub method: String,
    /// Path relative to the connector's base URL
    pub path: String,
    pub body: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub params: Option<StringMap>,
    /// Return a null result instead of an error on failure (default: true)
    #[serde(default = "default_silent")]
    pub silent: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallResponse {
    /// Parsed JSON result, null when the call produced none
    pub result: Option<Value>,
}

async fn load_credential(state: &AppState, name: &str) -> Result<ApiCredential, ApiError> {
    CredentialRepository::new(state.db.clone())
        .load(name)
        .await?
        .ok_or_else(|| not_found(&format!("Credential '{}' not found", name)))
}

/// Lists credentials with their connector codes
#[utoipa::path(
    get,
    path = "/credentials",
    responses(
        (status = 200, description = "All credentials", body = CredentialsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "credentials"
)]
pub async fn list_credentials(
    State(state): State<AppState>,
) -> Result<Json<CredentialsResponse>, ApiError> {
    let credentials = CredentialRepository::new(state.db.clone())
        .list_all()
        .await?
        .iter()
        .map(CredentialInfo::from)
        .collect();

    Ok(Json(CredentialsResponse { credentials }))
}

/// Activates or deactivates a credential and its log source
#[utoipa::path(
    patch,
    path = "/credentials/{name}",
    params(("name" = String, Path, description = "Credential name")),
    request_body = UpdateCredentialRequest,
    responses(
        (status = 200, description = "Updated credential", body = CredentialInfo),
        (status = 404, description = "Unknown credential", body = ApiError)
    ),
    tag = "credentials"
)]
pub async fn update_credential(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<UpdateCredentialRequest>,
) -> Result<Json<CredentialInfo>, ApiError> {
    let credential = load_credential(&state, &name).await?;
    let repo = CredentialRepository::new(state.db.clone());

    let updated = repo.set_active(credential.credential.id, body.active).await?;
    tracing::info!(credential = %updated.name, active = updated.active, "credential activation changed");

    Ok(Json(CredentialInfo::from(&ApiCredential::new(
        updated,
        credential.connector,
    ))))
}

/// Lists the request log of a credential, newest first
#[utoipa::path(
    get,
    path = "/credentials/{name}/logs",
    params(("name" = String, Path, description = "Credential name"), ListLogsQuery),
    responses(
        (status = 200, description = "Request log entries", body = LogEntriesResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Unknown credential", body = ApiError)
    ),
    tag = "credentials"
)]
pub async fn list_credential_logs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<LogEntriesResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    if !(1..=MAX_LOG_LIMIT).contains(&limit) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "limit must be between 1 and 200",
        ));
    }

    let credential = load_credential(&state, &name).await?;
    let logs = state
        .gateway
        .logs()
        .list_for_source(credential.log_source_id(), limit)
        .await?
        .into_iter()
        .map(LogEntryInfo::from)
        .collect();

    Ok(Json(LogEntriesResponse { logs }))
}

/// Performs a call through the request gateway with the credential
#[utoipa::path(
    post,
    path = "/credentials/{name}/requests",
    params(("name" = String, Path, description = "Credential name")),
    request_body = CallRequest,
    responses(
        (status = 200, description = "Call result", body = CallResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 404, description = "Unknown credential", body = ApiError),
        (status = 502, description = "Connector error (non-silent calls)", body = ApiError)
    ),
    tag = "credentials"
)]
pub async fn call_credential(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<CallRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    let method = Method::from_bytes(body.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
        validation_error(
            "Invalid HTTP method",
            json!({"method": format!("unsupported method '{}'", body.method)}),
        )
    })?;

    let credential = load_credential(&state, &name).await?;

    let mut request = ApiRequest::new(method, body.path);
    request.body = body.body;
    request.params = body.params;
    request.silent = body.silent;

    let result = state.gateway.api_request(&credential, request).await?;
    Ok(Json(CallResponse { result }))
}
