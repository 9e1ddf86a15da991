//! Activity ledger entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One reputation-affecting action.
///
/// Rows are never deleted. Undoing an action flags the row `cancelled`;
/// doing it again clears the flag on the same row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User whose reputation the row affects.
    pub user_id: String,

    /// Acting user when it differs from `user_id`, empty otherwise.
    #[sea_orm(default_value = "")]
    pub trigger_user_id: String,

    /// Object acted upon.
    pub object_id: String,

    /// Root object (the question for answers and comments).
    pub original_object_id: String,

    /// Activity type code from the config table.
    pub activity_type: i32,

    /// Reputation delta applied while the row is active.
    pub rank: i32,

    pub has_rank: bool,

    #[sea_orm(default_value = false)]
    pub cancelled: bool,

    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
