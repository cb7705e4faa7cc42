//! Loopback connector
//!
//! Talks to this service's own `/test/echo` endpoint. It exists to exercise
//! the pipeline end to end and as a reference for writing integrations:
//! only the header step is overridden, sending `text/plain`.

use crate::connectors::OverrideRegistry;
use crate::connectors::hooks::StaticHeaders;
use crate::connectors::registry::Hook;
use crate::gateway::StringMap;

/// Connector code of the loopback integration
pub const LOOPBACK_CODE: &str = "loopback";

/// Path of the echo endpoint, relative to the service root
pub const LOOPBACK_ECHO_PATH: &str = "/test/echo";

/// Register the loopback overrides
pub fn register_loopback_connector(registry: &mut OverrideRegistry) {
    let headers = StringMap::from([("Content-Type".to_string(), "text/plain".to_string())]);
    registry.register(LOOPBACK_CODE, Hook::api_headers(StaticHeaders(headers)));
}
