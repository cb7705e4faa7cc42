//! Migration to create the api_credentials table.
//!
//! Credentials bind an organisation to a connector and own exactly one
//! log source; deleting the source removes the credential with it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiCredentials::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApiCredentials::Name)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ApiCredentials::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ApiCredentials::TenantId).uuid().null())
                    .col(ColumnDef::new(ApiCredentials::ConnectorId).uuid().not_null())
                    .col(ColumnDef::new(ApiCredentials::LogSourceId).uuid().not_null())
                    .col(
                        ColumnDef::new(ApiCredentials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ApiCredentials::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_api_credentials_connector_id")
                            .from(ApiCredentials::Table, ApiCredentials::ConnectorId)
                            .to(ApiConnectors::Table, ApiConnectors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_api_credentials_log_source_id")
                            .from(ApiCredentials::Table, ApiCredentials::LogSourceId)
                            .to(HttpRequestLogSources::Table, HttpRequestLogSources::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_api_credentials_connector_id")
                    .table(ApiCredentials::Table)
                    .col(ApiCredentials::ConnectorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_api_credentials_connector_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ApiCredentials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiCredentials {
    Table,
    Id,
    Name,
    Active,
    TenantId,
    ConnectorId,
    LogSourceId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ApiConnectors {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum HttpRequestLogSources {
    Table,
    Id,
}
