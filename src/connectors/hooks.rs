//! Override hook traits
//!
//! Each extension point of the request pipeline is a small trait. Plain
//! closures implement the synchronous ones, so most integrations register
//! a closure rather than a dedicated type.

use async_trait::async_trait;
use serde_json::Value;

use crate::gateway::{ApiErrorInfo, ApiGateway, ApiRequest, ApiResponse, ConnectionError, StringMap};
use crate::models::api_credential::ApiCredential;

/// Replaces the whole request pipeline for a connector.
#[async_trait]
pub trait ApiRequestHook: Send + Sync {
    async fn api_request(
        &self,
        gateway: &ApiGateway,
        credential: &ApiCredential,
        request: ApiRequest,
    ) -> Result<Option<Value>, ConnectionError>;
}

/// Resolves the absolute URL of a request path.
pub trait ApiUrlHook: Send + Sync {
    fn api_url(&self, credential: &ApiCredential, path: &str) -> String;
}

/// Computes request headers; `renew_token` is set on the retry after a refresh.
#[async_trait]
pub trait ApiHeadersHook: Send + Sync {
    async fn api_headers(&self, credential: &ApiCredential, renew_token: bool) -> StringMap;
}

/// Classifies a response as success or failure.
pub trait ApiSuccessHook: Send + Sync {
    fn is_api_success(&self, credential: &ApiCredential, response: &ApiResponse) -> bool;
}

/// Extracts a diagnostic from a failed response whose body is JSON.
pub trait ParseApiErrorHook: Send + Sync {
    fn parse_api_error(
        &self,
        credential: &ApiCredential,
        response: &ApiResponse,
        body: &Value,
    ) -> ApiErrorInfo;
}

/// Refreshes the credential's access token; `true` when a retry is worthwhile.
#[async_trait]
pub trait RefreshApiTokenHook: Send + Sync {
    async fn refresh_api_token(&self, credential: &ApiCredential) -> bool;
}

impl<F> ApiUrlHook for F
where
    F: Fn(&ApiCredential, &str) -> String + Send + Sync,
{
    fn api_url(&self, credential: &ApiCredential, path: &str) -> String {
        self(credential, path)
    }
}

impl<F> ApiSuccessHook for F
where
    F: Fn(&ApiCredential, &ApiResponse) -> bool + Send + Sync,
{
    fn is_api_success(&self, credential: &ApiCredential, response: &ApiResponse) -> bool {
        self(credential, response)
    }
}

impl<F> ParseApiErrorHook for F
where
    F: Fn(&ApiCredential, &ApiResponse, &Value) -> ApiErrorInfo + Send + Sync,
{
    fn parse_api_error(
        &self,
        credential: &ApiCredential,
        response: &ApiResponse,
        body: &Value,
    ) -> ApiErrorInfo {
        self(credential, response, body)
    }
}

/// Header hook returning a fixed header set
pub struct StaticHeaders(pub StringMap);

#[async_trait]
impl ApiHeadersHook for StaticHeaders {
    async fn api_headers(&self, _credential: &ApiCredential, _renew_token: bool) -> StringMap {
        self.0.clone()
    }
}
