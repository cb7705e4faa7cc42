//! # Data Models
//!
//! SeaORM entities for connectors, credentials, log sources and request log
//! entries, plus small response types shared by the HTTP layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod api_connector;
pub mod api_credential;
pub mod http_request_log;
pub mod http_request_log_source;

pub use api_connector::Entity as ApiConnector;
pub use api_credential::Entity as ApiCredential;
pub use http_request_log::Entity as HttpRequestLog;
pub use http_request_log_source::Entity as HttpRequestLogSource;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "api-connector".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
