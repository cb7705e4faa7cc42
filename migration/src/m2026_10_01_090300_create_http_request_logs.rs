//! Migration to create the http_request_logs table.
//!
//! One row per outbound call attempt. Bodies above the source's size limit
//! live in the `*_file` binary columns with the inline text blanked.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HttpRequestLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HttpRequestLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HttpRequestLogs::LogSourceId).uuid().not_null())
                    .col(ColumnDef::new(HttpRequestLogs::Name).text().not_null())
                    .col(ColumnDef::new(HttpRequestLogs::Method).text().null())
                    .col(ColumnDef::new(HttpRequestLogs::Headers).text().null())
                    .col(ColumnDef::new(HttpRequestLogs::Params).text().null())
                    .col(ColumnDef::new(HttpRequestLogs::RequestBody).text().null())
                    .col(ColumnDef::new(HttpRequestLogs::RequestBodyFile).binary().null())
                    .col(ColumnDef::new(HttpRequestLogs::Code).text().null())
                    .col(ColumnDef::new(HttpRequestLogs::ResponseBody).text().null())
                    .col(ColumnDef::new(HttpRequestLogs::ResponseBodyFile).binary().null())
                    .col(ColumnDef::new(HttpRequestLogs::Error).text().null())
                    .col(ColumnDef::new(HttpRequestLogs::ErrorFile).binary().null())
                    .col(ColumnDef::new(HttpRequestLogs::DeleteByDate).date().null())
                    .col(
                        ColumnDef::new(HttpRequestLogs::ProcessedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogs::ProcessingSeconds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(HttpRequestLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_http_request_logs_log_source_id")
                            .from(HttpRequestLogs::Table, HttpRequestLogs::LogSourceId)
                            .to(HttpRequestLogSources::Table, HttpRequestLogSources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing logs for one source, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_http_request_logs_source_created")
                    .table(HttpRequestLogs::Table)
                    .col(HttpRequestLogs::LogSourceId)
                    .col(HttpRequestLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Retention sweeps
        manager
            .create_index(
                Index::create()
                    .name("idx_http_request_logs_delete_by_date")
                    .table(HttpRequestLogs::Table)
                    .col(HttpRequestLogs::DeleteByDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_http_request_logs_delete_by_date")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_http_request_logs_source_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(HttpRequestLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HttpRequestLogs {
    Table,
    Id,
    LogSourceId,
    Name,
    Method,
    Headers,
    Params,
    RequestBody,
    RequestBodyFile,
    Code,
    ResponseBody,
    ResponseBodyFile,
    Error,
    ErrorFile,
    DeleteByDate,
    ProcessedAt,
    ProcessingSeconds,
    CreatedAt,
}

#[derive(DeriveIden)]
enum HttpRequestLogSources {
    Table,
    Id,
}
