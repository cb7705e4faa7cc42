//! Migration to create the http_request_log_sources table.
//!
//! A log source is the policy bucket (retention, body size limit, enabled
//! flag) that every loggable owner embeds exactly once.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HttpRequestLogSources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HttpRequestLogSources::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::Name)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::Sequence)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::IsLogEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::LogRetentionPeriod)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::BodyTextLogLimit)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::ContentType)
                            .text()
                            .not_null()
                            .default("json"),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogSources::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HttpRequestLogSources::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HttpRequestLogSources {
    Table,
    Id,
    Name,
    Active,
    Sequence,
    IsLogEnabled,
    LogRetentionPeriod,
    BodyTextLogLimit,
    ContentType,
    CreatedAt,
    UpdatedAt,
}
