//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for
//! connectors, credentials, log sources and request log entries.

pub mod api_connector;
pub mod api_credential;
pub mod http_request_log;
pub mod http_request_log_source;

pub use api_connector::{ConnectorInUse, ConnectorRepository, NewConnector};
pub use api_credential::{CredentialRepository, NewCredential};
pub use http_request_log::HttpRequestLogRepository;
pub use http_request_log_source::LogSourceRepository;
