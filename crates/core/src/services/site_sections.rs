//! Typed site settings sections.
//!
//! Each section is stored as JSON in the `site_info` row of its type.

use agora_common::{AppError, AppResult};
use agora_db::entities::site_info::SiteInfoType;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use validator::Validate;

use crate::i18n::SUPPORTED_LANGUAGES;

/// A settings section stored in one `site_info` row.
pub trait SiteSection: Serialize + DeserializeOwned + Default + Validate + Send + Sync {
    const TYPE: SiteInfoType;

    /// Canonicalise the value before it is stored.
    fn normalize(&mut self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteGeneral {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(max = 255))]
    pub short_description: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[validate(url)]
    pub site_url: String,
    #[validate(email)]
    pub contact_email: String,
}

impl SiteSection for SiteGeneral {
    const TYPE: SiteInfoType = SiteInfoType::General;

    fn normalize(&mut self) -> AppResult<()> {
        self.site_url = self.site_url.trim().trim_end_matches('/').to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteInterface {
    #[validate(length(min = 1))]
    pub language: String,
    #[validate(length(min = 1))]
    pub time_zone: String,
}

impl Default for SiteInterface {
    fn default() -> Self {
        Self {
            language: "en_US".to_string(),
            time_zone: "UTC".to_string(),
        }
    }
}

impl SiteSection for SiteInterface {
    const TYPE: SiteInfoType = SiteInfoType::Interface;

    fn normalize(&mut self) -> AppResult<()> {
        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(AppError::BadRequest(format!(
                "language {} is not supported",
                self.language
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteBranding {
    pub logo: Option<String>,
    pub mobile_logo: Option<String>,
    pub square_icon: Option<String>,
    pub favicon: Option<String>,
}

impl SiteSection for SiteBranding {
    const TYPE: SiteInfoType = SiteInfoType::Branding;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteLogin {
    pub allow_new_registrations: bool,
    pub login_required: bool,
    pub allow_email_registrations: bool,
    /// Empty means every domain is accepted.
    pub allow_email_domains: Vec<String>,
}

impl Default for SiteLogin {
    fn default() -> Self {
        Self {
            allow_new_registrations: true,
            login_required: false,
            allow_email_registrations: true,
            allow_email_domains: Vec::new(),
        }
    }
}

impl SiteSection for SiteLogin {
    const TYPE: SiteInfoType = SiteInfoType::Login;

    fn normalize(&mut self) -> AppResult<()> {
        let mut domains: Vec<String> = self
            .allow_email_domains
            .iter()
            .map(|d| d.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        domains.sort();
        domains.dedup();
        self.allow_email_domains = domains;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteTheme {
    #[validate(length(min = 1, max = 64))]
    pub theme: String,
    pub color_scheme: String,
}

impl Default for SiteTheme {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            color_scheme: "system".to_string(),
        }
    }
}

impl SiteSection for SiteTheme {
    const TYPE: SiteInfoType = SiteInfoType::Theme;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteSeo {
    /// Question URL style, 1 to 4.
    #[validate(range(min = 1, max = 4))]
    pub permalink: i32,
    pub robots: String,
}

impl Default for SiteSeo {
    fn default() -> Self {
        Self {
            permalink: 1,
            robots: String::new(),
        }
    }
}

impl SiteSection for SiteSeo {
    const TYPE: SiteInfoType = SiteInfoType::Seo;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteUsers {
    pub default_avatar: String,
    pub allow_update_display_name: bool,
    pub allow_update_username: bool,
    pub allow_update_avatar: bool,
    pub allow_update_bio: bool,
    pub allow_update_website: bool,
    pub allow_update_location: bool,
}

impl Default for SiteUsers {
    fn default() -> Self {
        Self {
            default_avatar: "gravatar".to_string(),
            allow_update_display_name: true,
            allow_update_username: true,
            allow_update_avatar: true,
            allow_update_bio: true,
            allow_update_website: true,
            allow_update_location: true,
        }
    }
}

impl SiteSection for SiteUsers {
    const TYPE: SiteInfoType = SiteInfoType::Users;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteWrite {
    /// Questions must carry at least one tag.
    pub required_tag: bool,
    pub recommend_tags: Vec<String>,
    /// Tags only staff may attach.
    pub reserved_tags: Vec<String>,
}

impl SiteSection for SiteWrite {
    const TYPE: SiteInfoType = SiteInfoType::Write;

    fn normalize(&mut self) -> AppResult<()> {
        let clean = |tags: &[String]| {
            let mut out: Vec<String> = Vec::with_capacity(tags.len());
            for tag in tags.iter().map(|t| t.trim().to_lowercase()) {
                if !tag.is_empty() && !out.contains(&tag) {
                    out.push(tag);
                }
            }
            out
        };
        self.reserved_tags = clean(&self.reserved_tags);
        self.recommend_tags = clean(&self.recommend_tags)
            .into_iter()
            .filter(|t| !self.reserved_tags.contains(t))
            .collect();
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteLegal {
    pub terms_of_service: String,
    pub privacy_policy: String,
}

impl SiteSection for SiteLegal {
    const TYPE: SiteInfoType = SiteInfoType::Legal;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SiteCustomCssHtml {
    pub custom_head: String,
    pub custom_header: String,
    pub custom_footer: String,
    pub custom_css: String,
}

impl SiteSection for SiteCustomCssHtml {
    const TYPE: SiteInfoType = SiteInfoType::CssHtml;
}

/// Reputation needed for each rank-gated capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeThresholds {
    pub edit: i32,
    pub close: i32,
    pub reopen: i32,
    pub delete: i32,
}

impl PrivilegeThresholds {
    /// Preset of a privilege level. Unknown levels use level 2.
    #[must_use]
    pub const fn for_level(level: u8) -> Self {
        match level {
            1 => Self {
                edit: 100,
                close: 500,
                reopen: 500,
                delete: 2000,
            },
            3 => Self {
                edit: 1000,
                close: 3000,
                reopen: 3000,
                delete: 10000,
            },
            _ => Self {
                edit: 200,
                close: 1000,
                reopen: 1000,
                delete: 5000,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SitePrivileges {
    #[validate(range(min = 1, max = 3))]
    pub level: u8,
    /// Overrides the level preset when set.
    pub custom: Option<PrivilegeThresholds>,
}

impl Default for SitePrivileges {
    fn default() -> Self {
        Self {
            level: 2,
            custom: None,
        }
    }
}

impl SitePrivileges {
    /// Effective thresholds.
    #[must_use]
    pub fn thresholds(&self) -> PrivilegeThresholds {
        self.custom
            .unwrap_or_else(|| PrivilegeThresholds::for_level(self.level))
    }
}

impl SiteSection for SitePrivileges {
    const TYPE: SiteInfoType = SiteInfoType::Privileges;

    fn normalize(&mut self) -> AppResult<()> {
        if let Some(custom) = self.custom {
            let all = [custom.edit, custom.close, custom.reopen, custom.delete];
            if all.iter().any(|v| *v < 0) {
                return Err(AppError::BadRequest(
                    "privilege thresholds must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}
