//! Create config table migration and seed reference data.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Activity types: (code, key, rank delta).
pub const ACTIVITY_TYPES: &[(i32, &str, i32)] = &[
    (1, "question.asked", 0),
    (2, "question.closed", 0),
    (3, "question.reopened", 0),
    (4, "question.deleted", 0),
    (5, "question.vote_up", 0),
    (6, "question.vote_down", 0),
    (7, "question.voted_up", 10),
    (8, "question.voted_down", -2),
    (9, "answer.answered", 0),
    (10, "answer.deleted", -5),
    (11, "answer.vote_up", 0),
    (12, "answer.vote_down", -1),
    (13, "answer.voted_up", 10),
    (14, "answer.voted_down", -2),
    (15, "comment.created", 0),
    (16, "comment.deleted", 0),
    (17, "question.pinned", 0),
    (18, "question.unpinned", 0),
    (19, "question.hidden", 0),
    (20, "question.shown", 0),
];

/// Report reasons and moderator decisions: (id, key, name, description).
pub const REASONS: &[(i32, &str, &str, &str)] = &[
    (50, "reason.spam", "spam", "Promotional content or links unrelated to the topic."),
    (51, "reason.rude_or_abusive", "rude or abusive", "Disrespectful or threatening language."),
    (52, "reason.duplicate", "a duplicate", "The question has been asked and answered before."),
    (53, "reason.not_an_answer", "not an answer", "The post does not attempt to answer the question."),
    (54, "reason.no_longer_needed", "no longer needed", "The content is outdated or resolved."),
    (55, "reason.other", "something else", "Needs moderator attention for another reason."),
    (60, "reason.needs_delete", "needs delete", "Remove the content."),
    (61, "reason.needs_close", "needs close", "Close the question with a message."),
    (62, "reason.no_action", "no action", "Dismiss the report without changing the content."),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Config::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Config::Id).integer().not_null().primary_key())
                    .col(
                        ColumnDef::new(Config::Key)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Config::Value).text().not_null())
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert();
        insert
            .into_table(Config::Table)
            .columns([Config::Id, Config::Key, Config::Value]);

        for (id, key, rank) in ACTIVITY_TYPES {
            insert
                .values([(*id).into(), (*key).into(), rank.to_string().into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }
        for (id, key, name, description) in REASONS {
            let value = serde_json::json!({ "name": name, "description": description });
            insert
                .values([(*id).into(), (*key).into(), value.to_string().into()])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Config::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Config {
    Table,
    Id,
    Key,
    Value,
}
