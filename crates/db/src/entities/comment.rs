//! Comment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::question::ContentStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Question or answer the comment is attached to.
    pub object_id: String,

    /// Question the thread belongs to.
    pub question_id: String,

    /// Author.
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub original_text: String,

    pub status: ContentStatus,

    #[sea_orm(default_value = 0)]
    pub vote_count: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
