//! Create activity table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activity::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Activity::TriggerUserId)
                            .string_len(32)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Activity::ObjectId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Activity::OriginalObjectId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activity::ActivityType).integer().not_null())
                    .col(ColumnDef::new(Activity::Rank).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Activity::HasRank)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Activity::Cancelled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Activity::CancelledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Activity::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per action key; the insert is the atomic de-duplication check.
        manager
            .create_index(
                Index::create()
                    .name("uq_activity_key")
                    .table(Activity::Table)
                    .col(Activity::UserId)
                    .col(Activity::ObjectId)
                    .col(Activity::ActivityType)
                    .col(Activity::TriggerUserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (updated_at, cancelled) for leaderboard windows
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_updated_at_cancelled")
                    .table(Activity::Table)
                    .col(Activity::UpdatedAt)
                    .col(Activity::Cancelled)
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, object_id) for rank sums
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_user_object")
                    .table(Activity::Table)
                    .col(Activity::UserId)
                    .col(Activity::ObjectId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    UserId,
    TriggerUserId,
    ObjectId,
    OriginalObjectId,
    ActivityType,
    Rank,
    HasRank,
    Cancelled,
    CancelledAt,
    CreatedAt,
    UpdatedAt,
}
