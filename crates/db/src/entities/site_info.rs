//! Site settings entity. One row per settings section.

use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Settings section stored in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum SiteInfoType {
    #[sea_orm(string_value = "general")]
    General,
    #[sea_orm(string_value = "interface")]
    Interface,
    #[sea_orm(string_value = "branding")]
    Branding,
    #[sea_orm(string_value = "login")]
    Login,
    #[sea_orm(string_value = "theme")]
    Theme,
    #[sea_orm(string_value = "seo")]
    Seo,
    #[sea_orm(string_value = "users")]
    Users,
    #[sea_orm(string_value = "write")]
    Write,
    #[sea_orm(string_value = "privileges")]
    Privileges,
    #[sea_orm(string_value = "legal")]
    Legal,
    #[sea_orm(string_value = "css_html")]
    CssHtml,
}

impl SiteInfoType {
    /// Wire and cache-key name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Interface => "interface",
            Self::Branding => "branding",
            Self::Login => "login",
            Self::Theme => "theme",
            Self::Seo => "seo",
            Self::Users => "users",
            Self::Write => "write",
            Self::Privileges => "privileges",
            Self::Legal => "legal",
            Self::CssHtml => "css_html",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::iter().find(|t| t.as_str() == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site_info")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(column_name = "type", unique)]
    pub site_type: SiteInfoType,

    /// JSON document of the section.
    #[sea_orm(column_type = "Text")]
    pub content: String,

    #[sea_orm(default_value = 1)]
    pub status: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
