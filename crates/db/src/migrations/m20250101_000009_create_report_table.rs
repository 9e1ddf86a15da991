//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Report::ObjectId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Report::ReportedUserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Report::ObjectType).string_len(16).not_null())
                    .col(ColumnDef::new(Report::ReportType).string_len(32).not_null())
                    .col(ColumnDef::new(Report::Content).text().not_null().default(""))
                    .col(ColumnDef::new(Report::FlaggedType).string_len(32))
                    .col(ColumnDef::new(Report::FlaggedContent).text())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Report::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) for the moderation queue
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_created_at")
                    .table(Report::Table)
                    .col(Report::Status)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    UserId,
    ObjectId,
    ReportedUserId,
    ObjectType,
    ReportType,
    Content,
    FlaggedType,
    FlaggedContent,
    Status,
    CreatedAt,
    UpdatedAt,
}
