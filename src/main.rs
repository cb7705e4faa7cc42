//! # API Connector Main Entry Point

use std::sync::Arc;

use api_connector::{
    config::ConfigLoader, db::init_pool, migration::Migrator, seeds::seed_loopback,
    server::run_server, telemetry::init_tracing,
};
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "effective configuration");
    }

    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    if config.seed_demo_data {
        seed_loopback(Arc::new(db.clone()), &config).await?;
    }

    run_server(config, db).await
}
