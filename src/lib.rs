//! # API Connector Library
//!
//! Outbound API gateway with per-connector overrides and a transactional
//! request log store, plus the operator HTTP API that exposes both.

pub mod config;
pub mod connectors;
pub mod db;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod request_log;
pub mod retention;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub use migration;
