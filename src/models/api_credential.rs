//! Credential entity model
//!
//! A credential binds an (optional) organisation to a connector and embeds
//! exactly one log source. The gateway works on [`ApiCredential`], the
//! credential row joined with its connector.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use super::api_connector;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_credentials")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub name: String,

    /// Soft-delete flag; mirrored onto the embedded log source
    pub active: bool,

    /// Owning organisation, if any
    pub tenant_id: Option<Uuid>,

    pub connector_id: Uuid,

    /// Embedded log source (composition)
    pub log_source_id: Uuid,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::api_connector::Entity",
        from = "Column::ConnectorId",
        to = "super::api_connector::Column::Id"
    )]
    ApiConnector,
    #[sea_orm(
        belongs_to = "super::http_request_log_source::Entity",
        from = "Column::LogSourceId",
        to = "super::http_request_log_source::Column::Id",
        on_delete = "Cascade"
    )]
    HttpRequestLogSource,
}

impl Related<super::api_connector::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiConnector.def()
    }
}

impl Related<super::http_request_log_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HttpRequestLogSource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Credential resolved together with its connector.
///
/// This is the unit the request gateway operates on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiCredential {
    pub credential: Model,
    pub connector: api_connector::Model,
}

impl ApiCredential {
    pub fn new(credential: Model, connector: api_connector::Model) -> Self {
        Self {
            credential,
            connector,
        }
    }

    /// Override lookup key, derived from the connector
    pub fn code(&self) -> &str {
        &self.connector.code
    }

    pub fn name(&self) -> &str {
        &self.credential.name
    }

    pub fn api_url(&self) -> &str {
        &self.connector.api_url
    }
}
