//! Tag entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub slug_name: String,

    pub display_name: String,

    /// Only moderators may attach reserved tags.
    #[sea_orm(default_value = false)]
    pub reserved: bool,

    #[sea_orm(default_value = false)]
    pub recommend: bool,

    #[sea_orm(default_value = 0)]
    pub follow_count: i32,

    #[sea_orm(default_value = 0)]
    pub question_count: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
