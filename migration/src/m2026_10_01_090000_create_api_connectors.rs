//! Migration to create the api_connectors table.
//!
//! Each row describes one external API family. The `code` column is the
//! stable key used to resolve per-integration override hooks.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiConnectors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApiConnectors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApiConnectors::Code)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ApiConnectors::DisplayName).text().null())
                    .col(ColumnDef::new(ApiConnectors::ApiUrl).text().not_null())
                    .col(
                        ColumnDef::new(ApiConnectors::IsApiTokenUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ApiConnectors::IsApiTokenStatic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ApiConnectors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ApiConnectors::UpdatedAt)
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
            .drop_table(Table::drop().table(ApiConnectors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiConnectors {
    Table,
    Id,
    Code,
    DisplayName,
    ApiUrl,
    IsApiTokenUsed,
    IsApiTokenStatic,
    CreatedAt,
    UpdatedAt,
}
