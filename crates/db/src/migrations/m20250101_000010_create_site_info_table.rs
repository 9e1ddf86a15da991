//! Create site_info table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SiteInfo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SiteInfo::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SiteInfo::Type)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SiteInfo::Content).text().not_null())
                    .col(ColumnDef::new(SiteInfo::Status).integer().not_null().default(1))
                    .col(
                        ColumnDef::new(SiteInfo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SiteInfo::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SiteInfo::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SiteInfo {
    Table,
    Id,
    Type,
    Content,
    Status,
    CreatedAt,
    UpdatedAt,
}
