//! Per-user notification subscription entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category of events a user subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(64))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationSource {
    /// Every new question on the site.
    #[sea_orm(string_value = "all_new_question")]
    AllNewQuestion,
    /// New questions carrying a tag the user follows.
    #[sea_orm(string_value = "all_new_question_for_following_tags")]
    AllNewQuestionForFollowingTags,
    /// Activity on the user's own content (answers, comments, invites).
    #[sea_orm(string_value = "inbox")]
    Inbox,
}

/// Delivery medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
}

/// Enable flag of one channel, stored in the `channels` JSON column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSetting {
    pub key: NotificationChannel,
    pub enable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_notification_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    pub source: NotificationSource,

    /// JSON list of [`ChannelSetting`].
    #[sea_orm(column_type = "JsonBinary")]
    pub channels: Json,

    #[sea_orm(default_value = true)]
    pub enabled: bool,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Channel settings; malformed JSON reads as no channels.
    #[must_use]
    pub fn channel_settings(&self) -> Vec<ChannelSetting> {
        serde_json::from_value(self.channels.clone()).unwrap_or_default()
    }

    /// Channels the user has switched on, empty when the source is off.
    #[must_use]
    pub fn enabled_channels(&self) -> Vec<NotificationChannel> {
        if !self.enabled {
            return Vec::new();
        }
        self.channel_settings()
            .into_iter()
            .filter(|c| c.enable)
            .map(|c| c.key)
            .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(channels: Json, enabled: bool) -> Model {
        Model {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            source: NotificationSource::AllNewQuestion,
            channels,
            enabled,
            updated_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn test_enabled_channels() {
        let on = config(serde_json::json!([{ "key": "email", "enable": true }]), true);
        assert_eq!(on.enabled_channels(), vec![NotificationChannel::Email]);

        let off = config(serde_json::json!([{ "key": "email", "enable": false }]), true);
        assert!(off.enabled_channels().is_empty());

        let disabled = config(serde_json::json!([{ "key": "email", "enable": true }]), false);
        assert!(disabled.enabled_channels().is_empty());
    }

    #[test]
    fn test_malformed_channels_read_as_empty() {
        let bad = config(serde_json::json!({ "email": true }), true);
        assert!(bad.channel_settings().is_empty());
    }
}
