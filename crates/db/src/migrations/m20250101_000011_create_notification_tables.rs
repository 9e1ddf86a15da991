//! Create notification and user_notification_config tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserNotificationConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserNotificationConfig::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationConfig::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationConfig::Source)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationConfig::Channels)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationConfig::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserNotificationConfig::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_user_notification_config_user_source")
                    .table(UserNotificationConfig::Table)
                    .col(UserNotificationConfig::UserId)
                    .col(UserNotificationConfig::Source)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: source (for global subscriber lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_notification_config_source")
                    .table(UserNotificationConfig::Table)
                    .col(UserNotificationConfig::Source)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notification::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Notification::TriggerUserId).string_len(32))
                    .col(ColumnDef::new(Notification::ObjectId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Notification::ObjectType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::Action).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (user_id, is_read) (for unread count)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_user_is_read")
                    .table(Notification::Table)
                    .col(Notification::UserId)
                    .col(Notification::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserNotificationConfig::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum UserNotificationConfig {
    Table,
    Id,
    UserId,
    Source,
    Channels,
    Enabled,
    UpdatedAt,
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    UserId,
    TriggerUserId,
    ObjectId,
    ObjectType,
    Action,
    IsRead,
    CreatedAt,
}
