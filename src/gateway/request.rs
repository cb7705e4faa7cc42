//! Request and response types exchanged between the gateway and hooks.

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered header or query parameter map
pub type StringMap = BTreeMap<String, String>;

/// One logical call against a credential's API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the connector's base URL
    pub path: String,
    /// JSON request body
    pub body: Option<Value>,
    /// Query parameters
    pub params: Option<StringMap>,
    /// Explicit headers; computed by the header step when absent
    pub headers: Option<StringMap>,
    /// Return `Ok(None)` instead of raising on failure
    pub silent: bool,
    /// Set on the retry that follows a token refresh
    pub renew_token: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            params: None,
            headers: None,
            silent: true,
            renew_token: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params = Some(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = Some(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Raise [`ConnectionError`](super::ConnectionError) on failure instead of returning `None`
    pub fn raising(mut self) -> Self {
        self.silent = false;
        self
    }
}

/// A received HTTP response, detached from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: StringMap,
    pub text: String,
}

impl ApiResponse {
    pub fn new(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            headers: StringMap::new(),
            text: text.into(),
        }
    }

    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.text)
    }
}

/// Diagnostic extracted from a failed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorInfo {
    pub message: String,
    /// The API rejected the access token and a refresh may help
    pub is_refresh_token_needed: bool,
}

impl ApiErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_refresh_token_needed: false,
        }
    }

    pub fn refresh_needed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_refresh_token_needed: true,
        }
    }
}
