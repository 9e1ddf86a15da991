//! Create question table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Question::OriginalText).text().not_null())
                    .col(
                        ColumnDef::new(Question::Status)
                            .string_len(16)
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(Question::Pin)
                            .string_len(16)
                            .not_null()
                            .default("unpinned"),
                    )
                    .col(
                        ColumnDef::new(Question::Show)
                            .string_len(16)
                            .not_null()
                            .default("shown"),
                    )
                    .col(ColumnDef::new(Question::ViewCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Question::VoteCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Question::AnswerCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Question::CollectionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Question::FollowCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Question::AcceptedAnswerId).string_len(32))
                    .col(ColumnDef::new(Question::CloseMsg).text())
                    .col(
                        ColumnDef::new(Question::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Question::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_user")
                            .from(Question::Table, Question::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_question_user_id")
                    .table(Question::Table)
                    .col(Question::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    UserId,
    Title,
    OriginalText,
    Status,
    Pin,
    Show,
    ViewCount,
    VoteCount,
    AnswerCount,
    CollectionCount,
    FollowCount,
    AcceptedAnswerId,
    CloseMsg,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
