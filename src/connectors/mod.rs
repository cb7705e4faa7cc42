//! Connectors module
//!
//! Per-integration customisation of the request pipeline:
//! - Hook traits for each extension point
//! - The override registry keyed by connector code
//! - Built-in integrations

pub mod hooks;
pub mod loopback;
pub mod registry;

pub use hooks::{
    ApiHeadersHook, ApiRequestHook, ApiSuccessHook, ApiUrlHook, ParseApiErrorHook,
    RefreshApiTokenHook, StaticHeaders,
};
pub use loopback::{LOOPBACK_CODE, LOOPBACK_ECHO_PATH, register_loopback_connector};
pub use registry::{Hook, Operation, OverrideRegistry};
