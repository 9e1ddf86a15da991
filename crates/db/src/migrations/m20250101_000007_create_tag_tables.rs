//! Create tag and tag_rel tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tag::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Tag::SlugName)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Tag::DisplayName).string_len(64).not_null())
                    .col(ColumnDef::new(Tag::Reserved).boolean().not_null().default(false))
                    .col(ColumnDef::new(Tag::Recommend).boolean().not_null().default(false))
                    .col(ColumnDef::new(Tag::FollowCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Tag::QuestionCount).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Tag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TagRel::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TagRel::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TagRel::ObjectId).string_len(32).not_null())
                    .col(ColumnDef::new(TagRel::TagId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(TagRel::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tag_rel_tag")
                            .from(TagRel::Table, TagRel::TagId)
                            .to(Tag::Table, Tag::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_tag_rel_object_tag")
                    .table(TagRel::Table)
                    .col(TagRel::ObjectId)
                    .col(TagRel::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TagRel::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tag::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tag {
    Table,
    Id,
    SlugName,
    DisplayName,
    Reserved,
    Recommend,
    FollowCount,
    QuestionCount,
    CreatedAt,
}

#[derive(Iden)]
enum TagRel {
    Table,
    Id,
    ObjectId,
    TagId,
    CreatedAt,
}
