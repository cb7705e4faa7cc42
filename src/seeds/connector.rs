//! Loopback connector seeding

use anyhow::Result;
use sea_orm::DatabaseConnection;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::connectors::LOOPBACK_CODE;
use crate::repositories::{ConnectorRepository, CredentialRepository, NewConnector, NewCredential};

/// Name of the seeded credential
pub const TEST_CREDENTIAL_NAME: &str = "Test Credential";

/// Base URL under which this service reaches itself
pub fn loopback_base_url(bind_addr: SocketAddr) -> String {
    let ip = match bind_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}", SocketAddr::new(ip, bind_addr.port()))
}

/// Seeds the loopback connector and the test credential
///
/// Existing rows are left in place, so seeding on every start is safe.
///
/// # Arguments
///
/// * `db` - Database connection
/// * `config` - Application configuration; the bind address becomes the connector URL
///
/// # Returns
///
/// Returns a Result indicating success or failure
pub async fn seed_loopback(db: Arc<DatabaseConnection>, config: &AppConfig) -> Result<()> {
    let connectors = ConnectorRepository::new(db.clone());
    let credentials = CredentialRepository::new(db);

    let api_url = loopback_base_url(config.bind_addr()?);
    let connector = connectors
        .upsert(NewConnector {
            display_name: Some("Loopback".to_string()),
            ..NewConnector::new(LOOPBACK_CODE, api_url)
        })
        .await?;

    if credentials.load(TEST_CREDENTIAL_NAME).await?.is_some() {
        tracing::info!(credential = TEST_CREDENTIAL_NAME, "credential already exists, skipping");
    } else {
        let created = credentials
            .create(NewCredential::new(TEST_CREDENTIAL_NAME, connector.id))
            .await?;
        tracing::info!(
            credential = %created.name(),
            log_source_id = %created.credential.log_source_id,
            "created test credential"
        );
    }

    tracing::info!("Loopback seeding completed");
    Ok(())
}
