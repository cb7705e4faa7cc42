//! Database migrations for the API connector service.
//!
//! Tables are created in dependency order: connectors and log sources
//! first, then credentials and request logs that reference them.

pub use sea_orm_migration::prelude::*;

mod m2026_10_01_090000_create_api_connectors;
mod m2026_10_01_090100_create_http_request_log_sources;
mod m2026_10_01_090200_create_api_credentials;
mod m2026_10_01_090300_create_http_request_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_10_01_090000_create_api_connectors::Migration),
            Box::new(m2026_10_01_090100_create_http_request_log_sources::Migration),
            Box::new(m2026_10_01_090200_create_api_credentials::Migration),
            Box::new(m2026_10_01_090300_create_http_request_logs::Migration),
        ]
    }
}
