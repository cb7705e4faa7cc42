//! Request log repository
//!
//! Every write opens its own transaction on the shared pool and commits it
//! immediately, so entries persist even when the caller's surrounding
//! transaction is rolled back.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::http_request_log::{self, Entity as HttpRequestLog};
use crate::models::http_request_log_source::{
    self, DEFAULT_BODY_TEXT_LOG_LIMIT_KB, Entity as HttpRequestLogSource,
};
use crate::request_log::format::{fit_inline, normalize, normalize_text};
use crate::request_log::{LogEntryPatch, LogStoreError, NewLogEntry};

/// Repository for request log entries
#[derive(Debug, Clone)]
pub struct HttpRequestLogRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl HttpRequestLogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Records a call attempt against a log source.
    ///
    /// # Arguments
    ///
    /// * `source_id` - The log source the entry belongs to
    /// * `entry` - Request-side values of the attempt
    ///
    /// # Returns
    ///
    /// Returns the new entry id, `None` when logging is disabled on the source,
    /// or an error when the source is unknown or inactive
    pub async fn create_log(
        &self,
        source_id: Uuid,
        entry: NewLogEntry,
    ) -> Result<Option<Uuid>, LogStoreError> {
        let source = HttpRequestLogSource::find_by_id(source_id)
            .one(&*self.db)
            .await?
            .ok_or(LogStoreError::SourceNotFound { id: source_id })?;

        if !source.active {
            return Err(LogStoreError::SourceInactive { name: source.name });
        }
        if !source.is_log_enabled {
            return Ok(None);
        }

        let limit = source.body_limit_bytes();
        let now = Utc::now();
        let id = Uuid::new_v4();

        let (request_body, request_body_file) =
            fit_inline(entry.request_body.as_ref().and_then(normalize), limit);
        let (response_body, response_body_file) =
            fit_inline(entry.response_body.as_ref().and_then(normalize), limit);
        let (error, error_file) =
            fit_inline(entry.error.as_deref().and_then(normalize_text), limit);

        let log = http_request_log::ActiveModel {
            id: Set(id),
            log_source_id: Set(source.id),
            name: Set(entry.name),
            method: Set(entry.method),
            headers: Set(entry.headers),
            params: Set(entry.params),
            request_body: Set(request_body),
            request_body_file: Set(request_body_file),
            code: Set(entry.code),
            response_body: Set(response_body),
            response_body_file: Set(response_body_file),
            error: Set(error),
            error_file: Set(error_file),
            delete_by_date: Set(source.deletion_date(now.date_naive())),
            processed_at: Set(None),
            processing_seconds: Set(0),
            created_at: Set(now.into()),
        };

        let txn = self.db.begin().await?;
        log.insert(&txn).await?;
        txn.commit().await?;

        Ok(Some(id))
    }

    /// Writes the outcome of a call onto an existing entry.
    ///
    /// Never fails: a missing id, an unknown entry or a storage error all
    /// return `false`.
    pub async fn update_log(&self, log_id: Option<Uuid>, patch: LogEntryPatch) -> bool {
        let Some(id) = log_id else {
            return false;
        };

        match self.write_outcome(id, patch).await {
            Ok(updated) => updated,
            Err(error) => {
                debug!(log_id = %id, %error, "request log update suppressed");
                false
            }
        }
    }

    async fn write_outcome(&self, id: Uuid, patch: LogEntryPatch) -> Result<bool, DbErr> {
        let txn = self.db.begin().await?;

        let Some((existing, source)) = HttpRequestLog::find_by_id(id)
            .find_also_related(HttpRequestLogSource)
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(false);
        };

        let limit = source
            .as_ref()
            .map(http_request_log_source::Model::body_limit_bytes)
            .unwrap_or(DEFAULT_BODY_TEXT_LOG_LIMIT_KB as usize * 1024);

        let now = Utc::now();
        let elapsed = now.signed_duration_since(existing.created_at).num_seconds();
        let mut log: http_request_log::ActiveModel = existing.into();

        if let Some(code) = patch.code {
            log.code = Set(Some(code));
        }
        if let Some(body) = patch.response_body {
            let (inline, file) = fit_inline(normalize(&body), limit);
            log.response_body = Set(inline);
            log.response_body_file = Set(file);
        }
        if let Some(message) = patch.error {
            let (inline, file) = fit_inline(normalize_text(&message), limit);
            log.error = Set(inline);
            log.error_file = Set(file);
        }
        log.processed_at = Set(Some(now.into()));
        log.processing_seconds = Set(elapsed.clamp(0, i32::MAX as i64) as i32);

        log.update(&txn).await?;
        txn.commit().await?;

        Ok(true)
    }

    /// Deletes every entry whose deletion date is strictly before today (UTC).
    ///
    /// # Returns
    ///
    /// Returns the number of deleted entries
    pub async fn purge_expired(&self) -> Result<u64, LogStoreError> {
        self.purge_expired_before(Utc::now().date_naive()).await
    }

    pub async fn purge_expired_before(&self, date: NaiveDate) -> Result<u64, LogStoreError> {
        let result = HttpRequestLog::delete_many()
            .filter(http_request_log::Column::DeleteByDate.lt(date))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Counts the entries `purge_expired` would delete right now.
    pub async fn count_expired(&self) -> Result<u64, LogStoreError> {
        let count = HttpRequestLog::find()
            .filter(http_request_log::Column::DeleteByDate.lt(Utc::now().date_naive()))
            .count(&*self.db)
            .await?;
        Ok(count)
    }

    /// Lists entries of one source, newest first
    pub async fn list_for_source(
        &self,
        source_id: Uuid,
        limit: u64,
    ) -> Result<Vec<http_request_log::Model>, LogStoreError> {
        let logs = HttpRequestLog::find()
            .filter(http_request_log::Column::LogSourceId.eq(source_id))
            .order_by_desc(http_request_log::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok(logs)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<http_request_log::Model>, LogStoreError> {
        Ok(HttpRequestLog::find_by_id(id).one(&*self.db).await?)
    }
}
