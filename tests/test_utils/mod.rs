//! Test utilities for database and gateway testing.
//!
//! Sets up SQLite databases with migrations applied and inserts connector
//! and credential fixtures through the repositories.

use anyhow::Result;
use ::api_connector::config::GatewayConfig;
use ::api_connector::connectors::OverrideRegistry;
use ::api_connector::gateway::ApiGateway;
use ::api_connector::models::api_connector;
use ::api_connector::models::api_credential::ApiCredential;
use ::api_connector::repositories::{
    ConnectorRepository, CredentialRepository, NewConnector, NewCredential,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// In-memory SQLite runs on a single pooled connection.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up an in-memory SQLite database with all migrations applied and returns an Arc.
#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    let db = setup_test_db().await?;
    Ok(Arc::new(db))
}

/// Sets up a file-backed SQLite database with two pooled connections, for
/// tests that hold a transaction on one connection while the log store
/// writes on the other.
#[allow(dead_code)]
pub async fn setup_file_db(dir: &TempDir) -> Result<Arc<DatabaseConnection>> {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(2)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    Migrator::up(&db, None).await?;
    Ok(Arc::new(db))
}

/// Creates a connector with the given code and base URL.
#[allow(dead_code)]
pub async fn create_connector(
    db: &Arc<DatabaseConnection>,
    code: &str,
    api_url: &str,
) -> Result<api_connector::Model> {
    ConnectorRepository::new(db.clone())
        .create(NewConnector::new(code, api_url))
        .await
}

/// Creates a connector and a credential using it; the credential gets a
/// freshly provisioned log source.
#[allow(dead_code)]
pub async fn create_credential(
    db: &Arc<DatabaseConnection>,
    name: &str,
    code: &str,
    api_url: &str,
) -> Result<ApiCredential> {
    let connector = create_connector(db, code, api_url).await?;
    CredentialRepository::new(db.clone())
        .create(NewCredential::new(name, connector.id))
        .await
}

/// Builds a gateway with the default configuration over the given registry.
#[allow(dead_code)]
pub fn test_gateway(db: &Arc<DatabaseConnection>, registry: OverrideRegistry) -> ApiGateway {
    gateway_with_config(db, registry, GatewayConfig::default())
}

#[allow(dead_code)]
pub fn gateway_with_config(
    db: &Arc<DatabaseConnection>,
    registry: OverrideRegistry,
    config: GatewayConfig,
) -> ApiGateway {
    ApiGateway::new(db.clone(), Arc::new(registry), config).expect("build HTTP client")
}
