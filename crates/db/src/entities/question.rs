//! Question entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status shared by questions, answers and comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[sea_orm(string_value = "available")]
    #[default]
    Available,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

/// Pin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PinState {
    #[sea_orm(string_value = "unpinned")]
    #[default]
    Unpinned,
    #[sea_orm(string_value = "pinned")]
    Pinned,
}

/// Listing visibility flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ShowState {
    #[sea_orm(string_value = "shown")]
    #[default]
    Shown,
    #[sea_orm(string_value = "hidden")]
    Hidden,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author.
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub original_text: String,

    pub status: ContentStatus,

    pub pin: PinState,

    pub show: ShowState,

    #[sea_orm(default_value = 0)]
    pub view_count: i32,

    #[sea_orm(default_value = 0)]
    pub vote_count: i32,

    #[sea_orm(default_value = 0)]
    pub answer_count: i32,

    #[sea_orm(default_value = 0)]
    pub collection_count: i32,

    #[sea_orm(default_value = 0)]
    pub follow_count: i32,

    #[sea_orm(nullable)]
    pub accepted_answer_id: Option<String>,

    /// Moderator message shown while closed.
    #[sea_orm(column_type = "Text", nullable)]
    pub close_msg: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
