//! Request log entry entity model
//!
//! One row per outbound call attempt. Bodies larger than the source's
//! inline limit are stored byte-exact in the `*_file` columns and the
//! matching text column is left empty.

use base64::{Engine as _, engine::general_purpose};
use chrono::NaiveDate;
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "http_request_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub log_source_id: Uuid,

    /// Absolute target URL
    pub name: String,

    pub method: Option<String>,

    /// Request headers serialised as a JSON object
    pub headers: Option<String>,

    /// Query params serialised as JSON
    pub params: Option<String>,

    pub request_body: Option<String>,
    pub request_body_file: Option<Vec<u8>>,

    /// HTTP status as text, e.g. "400"
    pub code: Option<String>,

    pub response_body: Option<String>,
    pub response_body_file: Option<Vec<u8>>,

    pub error: Option<String>,
    pub error_file: Option<Vec<u8>>,

    pub delete_by_date: Option<NaiveDate>,

    pub processed_at: Option<DateTimeWithTimeZone>,

    /// Whole seconds between creation and processing, 0 when unknown
    pub processing_seconds: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::http_request_log_source::Entity",
        from = "Column::LogSourceId",
        to = "super::http_request_log_source::Column::Id",
        on_delete = "Cascade"
    )]
    HttpRequestLogSource,
}

impl Related<super::http_request_log_source::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HttpRequestLogSource.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn effective(inline: &Option<String>, spilled: &Option<Vec<u8>>) -> Option<String> {
    match spilled {
        Some(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        None => inline.clone().filter(|text| !text.is_empty()),
    }
}

fn encoded(spilled: &Option<Vec<u8>>) -> Option<String> {
    spilled
        .as_ref()
        .map(|bytes| general_purpose::STANDARD.encode(bytes))
}

impl Model {
    /// Request body text, whether it was stored inline or spilled
    pub fn request_body_text(&self) -> Option<String> {
        effective(&self.request_body, &self.request_body_file)
    }

    pub fn response_body_text(&self) -> Option<String> {
        effective(&self.response_body, &self.response_body_file)
    }

    pub fn error_text(&self) -> Option<String> {
        effective(&self.error, &self.error_file)
    }

    pub fn request_body_file_base64(&self) -> Option<String> {
        encoded(&self.request_body_file)
    }

    pub fn response_body_file_base64(&self) -> Option<String> {
        encoded(&self.response_body_file)
    }

    pub fn error_file_base64(&self) -> Option<String> {
        encoded(&self.error_file)
    }
}
