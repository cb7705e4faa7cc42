//! Connector repository for database operations
//!
//! Connectors are global: they describe an external API family and are
//! shared by every credential of that family.

use anyhow::{Result, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::models::api_connector::{self, Entity as ApiConnector};
use crate::models::api_credential::{self, Entity as ApiCredential};

/// A connector cannot be changed while active credentials depend on it
#[derive(Debug, Clone, Error)]
#[error("connector '{code}' is used by active credentials and cannot be changed")]
pub struct ConnectorInUse {
    pub code: String,
}

/// Values for a new connector
#[derive(Debug, Clone)]
pub struct NewConnector {
    pub code: String,
    pub display_name: Option<String>,
    pub api_url: String,
    pub is_api_token_used: bool,
    pub is_api_token_static: bool,
}

impl NewConnector {
    pub fn new(code: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: None,
            api_url: api_url.into(),
            is_api_token_used: false,
            is_api_token_static: false,
        }
    }
}

/// Repository for connector database operations
#[derive(Debug, Clone)]
pub struct ConnectorRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl ConnectorRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a new connector
    ///
    /// # Arguments
    ///
    /// * `connector` - Values of the connector to create; `api_url` must be an absolute URL
    ///
    /// # Returns
    ///
    /// Returns a Result containing the created connector model
    pub async fn create(&self, connector: NewConnector) -> Result<api_connector::Model> {
        Url::parse(&connector.api_url)
            .map_err(|e| anyhow!("invalid api_url '{}': {}", connector.api_url, e))?;

        let now = Utc::now();
        let model = api_connector::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(connector.code),
            display_name: Set(connector.display_name),
            api_url: Set(connector.api_url),
            is_api_token_used: Set(connector.is_api_token_used),
            is_api_token_static: Set(connector.is_api_token_static),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        Ok(model.insert(&*self.db).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<api_connector::Model>> {
        Ok(ApiConnector::find_by_id(id).one(&*self.db).await?)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<api_connector::Model>> {
        let connector = ApiConnector::find()
            .filter(api_connector::Column::Code.eq(code))
            .one(&*self.db)
            .await?;
        Ok(connector)
    }

    /// Lists all connectors ordered by code
    pub async fn list_all(&self) -> Result<Vec<api_connector::Model>> {
        let connectors = ApiConnector::find()
            .order_by_asc(api_connector::Column::Code)
            .all(&*self.db)
            .await?;
        Ok(connectors)
    }

    /// Changes the base URL of a connector
    ///
    /// # Returns
    ///
    /// Returns the updated connector, or [`ConnectorInUse`] when an active
    /// credential references it
    pub async fn update_api_url(&self, id: Uuid, api_url: &str) -> Result<api_connector::Model> {
        Url::parse(api_url).map_err(|e| anyhow!("invalid api_url '{}': {}", api_url, e))?;

        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Connector '{}' not found", id))?;

        let active_credentials = ApiCredential::find()
            .filter(api_credential::Column::ConnectorId.eq(id))
            .filter(api_credential::Column::Active.eq(true))
            .count(&*self.db)
            .await?;
        if active_credentials > 0 {
            return Err(ConnectorInUse {
                code: existing.code,
            }
            .into());
        }

        let mut connector: api_connector::ActiveModel = existing.into();
        connector.api_url = Set(api_url.to_string());
        connector.updated_at = Set(Utc::now().into());
        Ok(connector.update(&*self.db).await?)
    }

    /// Creates the connector or refreshes its display name, leaving the URL
    /// of an existing connector untouched
    pub async fn upsert(&self, connector: NewConnector) -> Result<api_connector::Model> {
        if let Some(existing) = self.find_by_code(&connector.code).await? {
            let mut am: api_connector::ActiveModel = existing.into();
            am.display_name = Set(connector.display_name);
            am.updated_at = Set(Utc::now().into());
            Ok(am.update(&*self.db).await?)
        } else {
            self.create(connector).await
        }
    }
}
