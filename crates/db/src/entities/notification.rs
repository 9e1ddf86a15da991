//! Inbox notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(64))")]
#[serde(rename_all = "snake_case")]
pub enum InboxAction {
    #[sea_orm(string_value = "answer_the_question")]
    AnswerTheQuestion,
    #[sea_orm(string_value = "comment_question")]
    CommentQuestion,
    #[sea_orm(string_value = "comment_answer")]
    CommentAnswer,
    #[sea_orm(string_value = "invited_you_to_answer")]
    InvitedYouToAnswer,
    #[sea_orm(string_value = "your_comment_was_deleted")]
    YourCommentWasDeleted,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Recipient.
    pub user_id: String,

    #[sea_orm(nullable)]
    pub trigger_user_id: Option<String>,

    pub object_id: String,

    pub object_type: String,

    pub action: InboxAction,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
