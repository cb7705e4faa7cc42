//! Credential repository for database operations
//!
//! Credentials own their log source: creation provisions one when none is
//! supplied, the active flag is mirrored onto it, and deletion removes it.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::api_connector::{self, Entity as ApiConnector};
use crate::models::api_credential::{self, ApiCredential, Entity as ApiCredentialEntity};
use crate::models::http_request_log_source::{self, Entity as HttpRequestLogSource};
use crate::repositories::http_request_log_source::provision_source;

/// Values for a new credential
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub name: String,
    pub connector_id: Uuid,
    pub tenant_id: Option<Uuid>,
    /// Existing log source to embed; a fresh one is provisioned when `None`
    pub log_source_id: Option<Uuid>,
}

impl NewCredential {
    pub fn new(name: impl Into<String>, connector_id: Uuid) -> Self {
        Self {
            name: name.into(),
            connector_id,
            tenant_id: None,
            log_source_id: None,
        }
    }
}

/// Repository for credential database operations
#[derive(Debug, Clone)]
pub struct CredentialRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl CredentialRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a credential together with its log source
    ///
    /// # Arguments
    ///
    /// * `credential` - Values of the credential to create
    ///
    /// # Returns
    ///
    /// Returns the credential joined with its connector
    pub async fn create(&self, credential: NewCredential) -> Result<ApiCredential> {
        let txn = self.db.begin().await?;

        let connector = ApiConnector::find_by_id(credential.connector_id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow!("Connector '{}' not found", credential.connector_id))?;

        let log_source_id = match credential.log_source_id {
            Some(id) => id,
            None => provision_source(&txn, &credential.name).await?.id,
        };

        let now = Utc::now();
        let model = api_credential::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(credential.name),
            active: Set(true),
            tenant_id: Set(credential.tenant_id),
            connector_id: Set(connector.id),
            log_source_id: Set(log_source_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(ApiCredential::new(model, connector))
    }

    /// Loads a credential with its connector by name
    pub async fn load(&self, name: &str) -> Result<Option<ApiCredential>> {
        let found = ApiCredentialEntity::find()
            .filter(api_credential::Column::Name.eq(name))
            .find_also_related(ApiConnector)
            .one(&*self.db)
            .await?;
        Self::joined(found)
    }

    pub async fn load_by_id(&self, id: Uuid) -> Result<Option<ApiCredential>> {
        let found = ApiCredentialEntity::find_by_id(id)
            .find_also_related(ApiConnector)
            .one(&*self.db)
            .await?;
        Self::joined(found)
    }

    fn joined(
        found: Option<(api_credential::Model, Option<api_connector::Model>)>,
    ) -> Result<Option<ApiCredential>> {
        match found {
            None => Ok(None),
            Some((credential, Some(connector))) => {
                Ok(Some(ApiCredential::new(credential, connector)))
            }
            Some((credential, None)) => Err(anyhow!(
                "Credential '{}' references a missing connector",
                credential.name
            )),
        }
    }

    /// Lists all credentials with their connectors, ordered by name
    pub async fn list_all(&self) -> Result<Vec<ApiCredential>> {
        let rows = ApiCredentialEntity::find()
            .find_also_related(ApiConnector)
            .order_by_asc(api_credential::Column::Name)
            .all(&*self.db)
            .await?;

        rows.into_iter()
            .map(|row| Self::joined(Some(row)))
            .filter_map(Result::transpose)
            .collect()
    }

    /// Toggles the credential's active flag and mirrors it onto its log source
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<api_credential::Model> {
        let txn = self.db.begin().await?;

        let existing = ApiCredentialEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow!("Credential '{}' not found", id))?;

        let now = Utc::now();
        if let Some(source) = HttpRequestLogSource::find_by_id(existing.log_source_id)
            .one(&txn)
            .await?
        {
            let mut source: http_request_log_source::ActiveModel = source.into();
            source.active = Set(active);
            source.updated_at = Set(now.into());
            source.update(&txn).await?;
        }

        let mut credential: api_credential::ActiveModel = existing.into();
        credential.active = Set(active);
        credential.updated_at = Set(now.into());
        let updated = credential.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes the credential and its embedded log source (and thereby its logs)
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;

        let existing = ApiCredentialEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow!("Credential '{}' not found", id))?;
        let source_id = existing.log_source_id;

        existing.delete(&txn).await?;
        HttpRequestLogSource::delete_by_id(source_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }
}
