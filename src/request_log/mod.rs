//! HTTP request log store.
//!
//! Log entries are written through [`HttpRequestLogRepository`] in their
//! own transaction so they survive a rollback of whatever business
//! transaction triggered the call. Owners such as API credentials reach the
//! store through the [`LogSourceOwner`] trait.
//!
//! [`HttpRequestLogRepository`]: crate::repositories::HttpRequestLogRepository

pub mod format;
pub mod owner;

use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::http_request_log_source::InvalidSettings;

pub use owner::LogSourceOwner;

/// Values recorded when a call is attempted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLogEntry {
    /// Absolute target URL
    pub name: String,
    pub method: Option<String>,
    pub headers: Option<String>,
    pub params: Option<String>,
    pub request_body: Option<Value>,
    pub code: Option<String>,
    pub response_body: Option<Value>,
    pub error: Option<String>,
}

impl NewLogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Outcome fields written once a call completes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogEntryPatch {
    pub code: Option<String>,
    pub response_body: Option<Value>,
    pub error: Option<String>,
}

impl LogEntryPatch {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn response(status: u16, body: Value) -> Self {
        Self {
            code: Some(status.to_string()),
            response_body: Some(body),
            error: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// Errors raised by the log store.
///
/// Only configuration problems are surfaced; write failures during updates
/// are absorbed by the store itself.
#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("log source {id} not found")]
    SourceNotFound { id: Uuid },
    #[error("log source '{name}' is not active")]
    SourceInactive { name: String },
    #[error("invalid log source settings: {0}")]
    InvalidSettings(#[from] InvalidSettings),
    #[error("log storage failed: {0}")]
    Database(#[from] sea_orm::DbErr),
}
