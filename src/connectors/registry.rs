//! Override registry
//!
//! Maps `(Operation, connector code)` to a hook. Lookups that find nothing
//! fall back to the gateway's default behaviour.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use utoipa::ToSchema;

use super::hooks::{
    ApiHeadersHook, ApiRequestHook, ApiSuccessHook, ApiUrlHook, ParseApiErrorHook,
    RefreshApiTokenHook,
};
use crate::config::AppConfig;

/// Extension points of the request pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ApiRequest,
    ApiUrl,
    ApiHeaders,
    IsApiSuccess,
    ParseApiError,
    RefreshApiToken,
}

/// A registered override
#[derive(Clone)]
pub enum Hook {
    ApiRequest(Arc<dyn ApiRequestHook>),
    ApiUrl(Arc<dyn ApiUrlHook>),
    ApiHeaders(Arc<dyn ApiHeadersHook>),
    IsApiSuccess(Arc<dyn ApiSuccessHook>),
    ParseApiError(Arc<dyn ParseApiErrorHook>),
    RefreshApiToken(Arc<dyn RefreshApiTokenHook>),
}

impl Hook {
    pub fn operation(&self) -> Operation {
        match self {
            Hook::ApiRequest(_) => Operation::ApiRequest,
            Hook::ApiUrl(_) => Operation::ApiUrl,
            Hook::ApiHeaders(_) => Operation::ApiHeaders,
            Hook::IsApiSuccess(_) => Operation::IsApiSuccess,
            Hook::ParseApiError(_) => Operation::ParseApiError,
            Hook::RefreshApiToken(_) => Operation::RefreshApiToken,
        }
    }

    pub fn api_request(hook: impl ApiRequestHook + 'static) -> Self {
        Hook::ApiRequest(Arc::new(hook))
    }

    pub fn api_url(hook: impl ApiUrlHook + 'static) -> Self {
        Hook::ApiUrl(Arc::new(hook))
    }

    pub fn api_headers(hook: impl ApiHeadersHook + 'static) -> Self {
        Hook::ApiHeaders(Arc::new(hook))
    }

    pub fn is_api_success(hook: impl ApiSuccessHook + 'static) -> Self {
        Hook::IsApiSuccess(Arc::new(hook))
    }

    pub fn parse_api_error(hook: impl ParseApiErrorHook + 'static) -> Self {
        Hook::ParseApiError(Arc::new(hook))
    }

    pub fn refresh_api_token(hook: impl RefreshApiTokenHook + 'static) -> Self {
        Hook::RefreshApiToken(Arc::new(hook))
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.operation()).finish()
    }
}

/// Registry of per-connector overrides
#[derive(Clone, Default)]
pub struct OverrideRegistry {
    hooks: HashMap<(Operation, String), Hook>,
}

impl OverrideRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in integrations registered
    pub fn initialize(_config: &AppConfig) -> Self {
        let mut registry = Self::new();
        crate::connectors::loopback::register_loopback_connector(&mut registry);
        registry
    }

    /// Register a hook for a connector code, replacing any previous hook for
    /// the same operation
    pub fn register(&mut self, code: impl Into<String>, hook: Hook) {
        self.hooks.insert((hook.operation(), code.into()), hook);
    }

    pub fn contains(&self, operation: Operation, code: &str) -> bool {
        self.hooks.contains_key(&(operation, code.to_string()))
    }

    fn lookup(&self, operation: Operation, code: &str) -> Option<&Hook> {
        self.hooks.get(&(operation, code.to_string()))
    }

    pub fn api_request(&self, code: &str) -> Option<Arc<dyn ApiRequestHook>> {
        match self.lookup(Operation::ApiRequest, code) {
            Some(Hook::ApiRequest(hook)) => Some(hook.clone()),
            _ => None,
        }
    }

    pub fn api_url(&self, code: &str) -> Option<Arc<dyn ApiUrlHook>> {
        match self.lookup(Operation::ApiUrl, code) {
            Some(Hook::ApiUrl(hook)) => Some(hook.clone()),
            _ => None,
        }
    }

    pub fn api_headers(&self, code: &str) -> Option<Arc<dyn ApiHeadersHook>> {
        match self.lookup(Operation::ApiHeaders, code) {
            Some(Hook::ApiHeaders(hook)) => Some(hook.clone()),
            _ => None,
        }
    }

    pub fn is_api_success(&self, code: &str) -> Option<Arc<dyn ApiSuccessHook>> {
        match self.lookup(Operation::IsApiSuccess, code) {
            Some(Hook::IsApiSuccess(hook)) => Some(hook.clone()),
            _ => None,
        }
    }

    pub fn parse_api_error(&self, code: &str) -> Option<Arc<dyn ParseApiErrorHook>> {
        match self.lookup(Operation::ParseApiError, code) {
            Some(Hook::ParseApiError(hook)) => Some(hook.clone()),
            _ => None,
        }
    }

    pub fn refresh_api_token(&self, code: &str) -> Option<Arc<dyn RefreshApiTokenHook>> {
        match self.lookup(Operation::RefreshApiToken, code) {
            Some(Hook::RefreshApiToken(hook)) => Some(hook.clone()),
            _ => None,
        }
    }

    /// Operations overridden for a connector, in pipeline order
    pub fn overrides_for(&self, code: &str) -> Vec<Operation> {
        let mut operations: Vec<_> = self
            .hooks
            .keys()
            .filter(|(_, registered)| registered == code)
            .map(|(operation, _)| *operation)
            .collect();
        operations.sort();
        operations
    }
}

impl fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideRegistry")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
