//! Delegation from log-source owners to the request log store.

use async_trait::async_trait;
use uuid::Uuid;

use super::{LogEntryPatch, LogStoreError, NewLogEntry};
use crate::repositories::HttpRequestLogRepository;

/// An entity that embeds exactly one log source.
///
/// Implementors only name their source; writing entries is provided.
#[async_trait]
pub trait LogSourceOwner: Send + Sync {
    fn log_source_id(&self) -> Uuid;

    async fn create_log(
        &self,
        logs: &HttpRequestLogRepository,
        entry: NewLogEntry,
    ) -> Result<Option<Uuid>, LogStoreError> {
        logs.create_log(self.log_source_id(), entry).await
    }

    async fn update_log(
        &self,
        logs: &HttpRequestLogRepository,
        log_id: Option<Uuid>,
        patch: LogEntryPatch,
    ) -> bool {
        logs.update_log(log_id, patch).await
    }
}

impl LogSourceOwner for crate::models::api_credential::Model {
    fn log_source_id(&self) -> Uuid {
        self.log_source_id
    }
}

impl LogSourceOwner for crate::models::api_credential::ApiCredential {
    fn log_source_id(&self) -> Uuid {
        self.credential.log_source_id
    }
}
