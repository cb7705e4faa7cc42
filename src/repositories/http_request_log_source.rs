//! Log source repository
//!
//! Log sources are never created directly by operators; owners provision
//! them through [`LogSourceRepository::provision_for`].

use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose};
use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::http_request_log_source::{
    self, DEFAULT_BODY_TEXT_LOG_LIMIT_KB, Entity as HttpRequestLogSource, LogContentType,
    LogSourceSettings,
};

/// Random suffix appended to provisioned source names: 6 random bytes, base64 encoded
fn random_suffix() -> String {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::STANDARD.encode(bytes)
}

/// Inserts a new source with default settings using the given connection.
///
/// Used directly by owners that need the source inside their own transaction.
pub async fn provision_source<C>(conn: &C, owner: &str) -> Result<http_request_log_source::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let source = http_request_log_source::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(format!("{}_{}", owner, random_suffix())),
        active: Set(true),
        sequence: Set(1),
        is_log_enabled: Set(true),
        log_retention_period: Set(0),
        body_text_log_limit: Set(DEFAULT_BODY_TEXT_LOG_LIMIT_KB),
        content_type: Set(LogContentType::Json.as_str().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    Ok(source.insert(conn).await?)
}

/// Repository for log source database operations
#[derive(Debug, Clone)]
pub struct LogSourceRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl LogSourceRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a uniquely named source for an owner
    ///
    /// # Arguments
    ///
    /// * `owner` - Name of the owning record, used as the name prefix
    ///
    /// # Returns
    ///
    /// Returns the created source named `<owner>_<8 base64 chars>`
    pub async fn provision_for(&self, owner: &str) -> Result<http_request_log_source::Model> {
        provision_source(&*self.db, owner).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<http_request_log_source::Model>> {
        Ok(HttpRequestLogSource::find_by_id(id).one(&*self.db).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<http_request_log_source::Model>> {
        let source = HttpRequestLogSource::find()
            .filter(http_request_log_source::Column::Name.eq(name))
            .one(&*self.db)
            .await?;
        Ok(source)
    }

    /// Lists sources by sequence, then name
    pub async fn list_all(&self) -> Result<Vec<http_request_log_source::Model>> {
        let sources = HttpRequestLogSource::find()
            .order_by_asc(http_request_log_source::Column::Sequence)
            .order_by_asc(http_request_log_source::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(sources)
    }

    /// Applies a validated partial settings update
    ///
    /// # Returns
    ///
    /// Returns the updated source, or an error if the settings are invalid
    /// or the source does not exist
    pub async fn update_settings(
        &self,
        id: Uuid,
        settings: LogSourceSettings,
    ) -> Result<http_request_log_source::Model> {
        settings.validate()?;

        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| anyhow!("Log source '{}' not found", id))?;

        let mut source: http_request_log_source::ActiveModel = existing.into();
        if let Some(enabled) = settings.is_log_enabled {
            source.is_log_enabled = Set(enabled);
        }
        if let Some(active) = settings.active {
            source.active = Set(active);
        }
        if let Some(days) = settings.log_retention_period {
            source.log_retention_period = Set(days);
        }
        if let Some(limit) = settings.body_text_log_limit {
            source.body_text_log_limit = Set(limit);
        }
        if let Some(content_type) = settings.content_type {
            source.content_type = Set(content_type.as_str().to_string());
        }
        source.updated_at = Set(Utc::now().into());

        Ok(source.update(&*self.db).await?)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<http_request_log_source::Model> {
        self.update_settings(
            id,
            LogSourceSettings {
                active: Some(active),
                ..Default::default()
            },
        )
        .await
    }
}
