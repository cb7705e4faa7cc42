//! Log source entity model
//!
//! A log source carries the logging policy of one owner: whether logging is
//! enabled, how long entries are retained and how large an inline body may
//! grow before it is moved to the binary side-field.

use chrono::{Days, NaiveDate};
use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Default inline body limit, in kilobytes
pub const DEFAULT_BODY_TEXT_LOG_LIMIT_KB: i32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "http_request_log_sources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub name: String,

    pub active: bool,

    pub sequence: i32,

    pub is_log_enabled: bool,

    /// Days to keep entries; 0 keeps them forever
    pub log_retention_period: i32,

    /// Inline body limit in kilobytes
    pub body_text_log_limit: i32,

    /// Display hint: json, xml or html
    pub content_type: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::http_request_log::Entity")]
    HttpRequestLog,
}

impl Related<super::http_request_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HttpRequestLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Date after which an entry created on `created_on` may be purged.
    ///
    /// Returns `None` when the retention period is 0 (keep forever).
    pub fn deletion_date(&self, created_on: NaiveDate) -> Option<NaiveDate> {
        if self.log_retention_period <= 0 {
            return None;
        }
        created_on.checked_add_days(Days::new(self.log_retention_period as u64))
    }

    /// Inline body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        (self.body_text_log_limit.max(0) as usize).saturating_mul(1024)
    }
}

/// Display hint for logged bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogContentType {
    Json,
    Xml,
    Html,
}

impl LogContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogContentType::Json => "json",
            LogContentType::Xml => "xml",
            LogContentType::Html => "html",
        }
    }
}

impl std::str::FromStr for LogContentType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "json" => Ok(LogContentType::Json),
            "xml" => Ok(LogContentType::Xml),
            "html" => Ok(LogContentType::Html),
            other => Err(format!("unsupported content type '{}'", other)),
        }
    }
}

/// Partial update of a log source's configuration surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LogSourceSettings {
    pub is_log_enabled: Option<bool>,
    pub active: Option<bool>,
    #[schema(minimum = 0)]
    pub log_retention_period: Option<i32>,
    #[schema(minimum = 1)]
    pub body_text_log_limit: Option<i32>,
    pub content_type: Option<LogContentType>,
}

/// A rejected settings value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSettings {
    #[error("log_retention_period must be zero or positive, got {0}")]
    NegativeRetention(i32),
    #[error("body_text_log_limit must be positive, got {0}")]
    NonPositiveBodyLimit(i32),
}

impl LogSourceSettings {
    pub fn validate(&self) -> Result<(), InvalidSettings> {
        if let Some(days) = self.log_retention_period
            && days < 0
        {
            return Err(InvalidSettings::NegativeRetention(days));
        }
        if let Some(limit) = self.body_text_log_limit
            && limit <= 0
        {
            return Err(InvalidSettings::NonPositiveBodyLimit(limit));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn source(retention: i32, limit: i32) -> Model {
        let now = Utc::now().into();
        Model {
            id: Uuid::new_v4(),
            name: "test_source".to_string(),
            active: true,
            sequence: 1,
            is_log_enabled: true,
            log_retention_period: retention,
            body_text_log_limit: limit,
            content_type: "json".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_deletion_date_adds_retention_days() {
        let created = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        assert_eq!(
            source(3, 100).deletion_date(created),
            NaiveDate::from_ymd_opt(2026, 3, 2)
        );
    }

    #[test]
    fn test_zero_retention_keeps_forever() {
        let created = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(source(0, 100).deletion_date(created), None);
    }

    #[test]
    fn test_body_limit_bytes() {
        assert_eq!(source(0, 10).body_limit_bytes(), 10 * 1024);
    }

    #[test]
    fn test_settings_validation() {
        assert!(LogSourceSettings::default().validate().is_ok());

        let negative = LogSourceSettings {
            log_retention_period: Some(-1),
            ..Default::default()
        };
        assert_eq!(
            negative.validate(),
            Err(InvalidSettings::NegativeRetention(-1))
        );

        let zero_limit = LogSourceSettings {
            body_text_log_limit: Some(0),
            ..Default::default()
        };
        assert_eq!(
            zero_limit.validate(),
            Err(InvalidSettings::NonPositiveBodyLimit(0))
        );
    }

    #[test]
    fn test_content_type_parsing() {
        assert_eq!("xml".parse::<LogContentType>(), Ok(LogContentType::Xml));
        assert!("yaml".parse::<LogContentType>().is_err());
    }
}
