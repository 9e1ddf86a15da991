//! Report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report status. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, Default)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// Why the reporter flagged the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    #[sea_orm(string_value = "spam")]
    Spam,
    #[sea_orm(string_value = "rude_or_abusive")]
    RudeOrAbusive,
    #[sea_orm(string_value = "duplicate")]
    Duplicate,
    #[sea_orm(string_value = "not_an_answer")]
    NotAnAnswer,
    #[sea_orm(string_value = "no_longer_needed")]
    NoLongerNeeded,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ReportReason {
    /// Config key holding the display payload of this reason.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Spam => "reason.spam",
            Self::RudeOrAbusive => "reason.rude_or_abusive",
            Self::Duplicate => "reason.duplicate",
            Self::NotAnAnswer => "reason.not_an_answer",
            Self::NoLongerNeeded => "reason.no_longer_needed",
            Self::Other => "reason.other",
        }
    }
}

/// Moderator decision recorded when a report is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum FlaggedType {
    #[sea_orm(string_value = "needs_delete")]
    NeedsDelete,
    #[sea_orm(string_value = "needs_close")]
    NeedsClose,
    #[sea_orm(string_value = "no_action")]
    NoAction,
}

impl FlaggedType {
    /// Config key holding the display payload of this decision.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::NeedsDelete => "reason.needs_delete",
            Self::NeedsClose => "reason.needs_close",
            Self::NoAction => "reason.no_action",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Reporter.
    pub user_id: String,

    pub object_id: String,

    /// Author of the reported object.
    pub reported_user_id: String,

    /// Kind of the reported object (`question`, `answer`, `comment`).
    pub object_type: String,

    pub report_type: ReportReason,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(nullable)]
    pub flagged_type: Option<FlaggedType>,

    #[sea_orm(column_type = "Text", nullable)]
    pub flagged_content: Option<String>,

    pub status: ReportStatus,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
