//! Connector entity model
//!
//! A connector describes one external API family: its base URL and the
//! stable `code` under which per-integration override hooks are registered.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "api_connectors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Stable identifier used to resolve override hooks
    #[sea_orm(unique)]
    pub code: String,

    pub display_name: Option<String>,

    /// Base URL every request path is appended to
    pub api_url: String,

    /// Descriptive only; token handling lives in the header hooks
    pub is_api_token_used: bool,
    pub is_api_token_static: bool,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::api_credential::Entity")]
    ApiCredential,
}

impl Related<super::api_credential::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiCredential.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
