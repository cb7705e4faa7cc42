//! # Request Gateway
//!
//! Turns a logical `(method, path, body, params)` call against a credential
//! into an HTTP exchange. Every step can be overridden per connector through
//! the [`OverrideRegistry`]; each attempt is recorded in the credential's
//! request log, and a call the API rejects for an expired token is retried
//! once after a successful refresh.
//!
//! Failures are governed by [`ApiRequest::silent`]: silent calls return
//! `Ok(None)`, raising calls return a [`ConnectionError`]. A success response
//! whose body is not JSON always yields `Ok(None)`.

pub mod error;
pub mod request;
pub mod text;

use metrics::{counter, histogram};
use reqwest::redirect::Policy;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::{GatewayConfig, RetryHeaders};
use crate::connectors::OverrideRegistry;
use crate::models::api_credential::ApiCredential;
use crate::repositories::HttpRequestLogRepository;
use crate::request_log::{LogEntryPatch, LogSourceOwner, NewLogEntry};

pub use error::{ConnectionError, FailureKind};
pub use request::{ApiErrorInfo, ApiRequest, ApiResponse, StringMap};

/// Per-call network timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_REDIRECTS: usize = 10;

/// Result of a single attempt
enum Attempt {
    Done(Option<Value>),
    /// The token was refreshed; the caller should retry once
    RetryAfterRefresh,
}

/// Outbound API gateway shared by all credentials
#[derive(Clone)]
pub struct ApiGateway {
    http: reqwest::Client,
    logs: HttpRequestLogRepository,
    registry: Arc<OverrideRegistry>,
    config: GatewayConfig,
}

impl ApiGateway {
    /// Create a gateway with the standard HTTP client (60s timeout, redirects followed)
    pub fn new(
        db: Arc<DatabaseConnection>,
        registry: Arc<OverrideRegistry>,
        config: GatewayConfig,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self::with_http_client(http, db, registry, config))
    }

    /// Create a gateway around a caller-supplied HTTP client
    pub fn with_http_client(
        http: reqwest::Client,
        db: Arc<DatabaseConnection>,
        registry: Arc<OverrideRegistry>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            http,
            logs: HttpRequestLogRepository::new(db),
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &OverrideRegistry {
        &self.registry
    }

    pub fn logs(&self) -> &HttpRequestLogRepository {
        &self.logs
    }

    /// Perform a call against the credential's API.
    ///
    /// Delegates entirely to an `ApiRequest` override when the credential's
    /// connector registered one; otherwise runs [`ApiGateway::dispatch`].
    #[instrument(skip_all, fields(credential = %credential.name(), code = %credential.code(), method = %request.method, path = %request.path))]
    pub async fn api_request(
        &self,
        credential: &ApiCredential,
        request: ApiRequest,
    ) -> Result<Option<Value>, ConnectionError> {
        if let Some(hook) = self.registry.api_request(credential.code()) {
            debug!("delegating to api_request override");
            return hook.api_request(self, credential, request).await;
        }
        self.dispatch(credential, request).await
    }

    /// The default request pipeline, also available to `ApiRequest` overrides.
    pub async fn dispatch(
        &self,
        credential: &ApiCredential,
        mut request: ApiRequest,
    ) -> Result<Option<Value>, ConnectionError> {
        // An attempt with renew_token set never asks for another retry.
        loop {
            match self.attempt(credential, &request).await? {
                Attempt::Done(result) => return Ok(result),
                Attempt::RetryAfterRefresh => {
                    info!(credential = %credential.name(), "retrying after token refresh");
                    request.renew_token = true;
                    if self.config.retry_headers == RetryHeaders::Recompute {
                        request.headers = None;
                    }
                }
            }
        }
    }

    async fn attempt(
        &self,
        credential: &ApiCredential,
        request: &ApiRequest,
    ) -> Result<Attempt, ConnectionError> {
        let headers = match &request.headers {
            Some(headers) => headers.clone(),
            None => self.api_headers(credential, request.renew_token).await,
        };
        let url = self.api_url(credential, &request.path);
        let log_id = self.open_log(credential, &url, request, &headers).await;

        let mut builder = self.http.request(request.method.clone(), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(params) = &request.params {
            builder = builder.query(params);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = match self.send(builder).await {
            Ok(response) => response,
            Err(message) => {
                warn!(credential = %credential.name(), url = %url, error = %message, "API request failed");
                credential
                    .update_log(&self.logs, log_id, LogEntryPatch::error(message.clone()))
                    .await;
                record(credential, "transport_error", started);
                return self.fail(request, ConnectionError::transport(credential.name(), message));
            }
        };
        let status = response.status;

        if self.is_api_success(credential, &response) {
            return match response.json() {
                Ok(body) => {
                    credential
                        .update_log(&self.logs, log_id, LogEntryPatch::response(status, body.clone()))
                        .await;
                    record(credential, "success", started);
                    Ok(Attempt::Done(Some(body)))
                }
                Err(error) => {
                    debug!(credential = %credential.name(), %error, "success response is not JSON");
                    let patch = LogEntryPatch::response(status, Value::String(response.text))
                        .with_error(error.to_string());
                    credential.update_log(&self.logs, log_id, patch).await;
                    record(credential, "invalid_body", started);
                    Ok(Attempt::Done(None))
                }
            };
        }

        let body = match response.json() {
            Ok(body) => body,
            Err(error) => {
                debug!(credential = %credential.name(), %error, "failure response is not JSON");
                let readable = text::readable_text(&response.text);
                let first_line = text::first_line(&readable).to_string();
                let patch = LogEntryPatch::response(status, Value::String(response.text))
                    .with_error(first_line);
                credential.update_log(&self.logs, log_id, patch).await;
                record(credential, "api_error", started);
                return self.fail(
                    request,
                    ConnectionError::new(credential.name(), readable, FailureKind::Api { status }),
                );
            }
        };

        let info = self.parse_api_error(credential, &response, &body);
        let patch = LogEntryPatch::response(status, Value::String(response.text.clone()))
            .with_error(info.message.clone());
        credential.update_log(&self.logs, log_id, patch).await;
        record(credential, "api_error", started);

        if info.is_refresh_token_needed {
            if request.renew_token {
                warn!(credential = %credential.name(), status, "token still rejected after refresh");
            } else if self.refresh_api_token(credential).await {
                return Ok(Attempt::RetryAfterRefresh);
            } else {
                warn!(credential = %credential.name(), status, "token refresh failed");
            }
            return self.fail(
                request,
                ConnectionError::new(
                    credential.name(),
                    info.message,
                    FailureKind::TokenRefresh { status },
                ),
            );
        }

        self.fail(
            request,
            ConnectionError::new(credential.name(), info.message, FailureKind::Api { status }),
        )
    }

    /// Sends the request and reads the whole body; any failure is a transport error
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse, String> {
        let response = builder.send().await.map_err(|e| transport_message(&e))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(|e| transport_message(&e))?;
        Ok(ApiResponse {
            status,
            headers,
            text,
        })
    }

    fn fail(&self, request: &ApiRequest, error: ConnectionError) -> Result<Attempt, ConnectionError> {
        if request.silent {
            debug!(%error, "suppressing API failure for silent request");
            Ok(Attempt::Done(None))
        } else {
            Err(error)
        }
    }

    async fn open_log(
        &self,
        credential: &ApiCredential,
        url: &str,
        request: &ApiRequest,
        headers: &StringMap,
    ) -> Option<Uuid> {
        let entry = NewLogEntry {
            name: url.to_string(),
            method: Some(request.method.to_string()),
            headers: serde_json::to_string(headers).ok(),
            params: request
                .params
                .as_ref()
                .and_then(|params| serde_json::to_string(params).ok()),
            request_body: request.body.clone(),
            ..Default::default()
        };

        match credential.create_log(&self.logs, entry).await {
            Ok(log_id) => log_id,
            Err(error) => {
                debug!(credential = %credential.name(), %error, "request log entry not created");
                None
            }
        }
    }

    /// Absolute URL of `path` for this credential
    pub fn api_url(&self, credential: &ApiCredential, path: &str) -> String {
        match self.registry.api_url(credential.code()) {
            Some(hook) => hook.api_url(credential, path),
            None => default_api_url(credential.api_url(), path),
        }
    }

    pub async fn api_headers(&self, credential: &ApiCredential, renew_token: bool) -> StringMap {
        match self.registry.api_headers(credential.code()) {
            Some(hook) => hook.api_headers(credential, renew_token).await,
            None => default_api_headers(),
        }
    }

    pub fn is_api_success(&self, credential: &ApiCredential, response: &ApiResponse) -> bool {
        match self.registry.is_api_success(credential.code()) {
            Some(hook) => hook.is_api_success(credential, response),
            None => (200..300).contains(&response.status),
        }
    }

    pub fn parse_api_error(
        &self,
        credential: &ApiCredential,
        response: &ApiResponse,
        body: &Value,
    ) -> ApiErrorInfo {
        match self.registry.parse_api_error(credential.code()) {
            Some(hook) => hook.parse_api_error(credential, response, body),
            None => ApiErrorInfo::new(response.text.clone()),
        }
    }

    pub async fn refresh_api_token(&self, credential: &ApiCredential) -> bool {
        match self.registry.refresh_api_token(credential.code()) {
            Some(hook) => hook.refresh_api_token(credential).await,
            None => false,
        }
    }
}

/// `base` and `path` joined by exactly one slash
pub fn default_api_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_matches('/'), path.trim_matches('/'))
}

pub fn default_api_headers() -> StringMap {
    StringMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ])
}

/// reqwest's top-level message omits the cause; append the source chain
fn transport_message(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn record(credential: &ApiCredential, outcome: &'static str, started: Instant) {
    let labels = vec![
        ("connector", credential.code().to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!("api_gateway_requests_total", &labels).increment(1);
    histogram!("api_gateway_request_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
}
