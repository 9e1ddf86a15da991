//! Per-user notification subscriptions.

use std::sync::Arc;

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{
    entities::user_notification_config::{
        self, ChannelSetting, NotificationChannel, NotificationSource,
    },
    repositories::NotificationConfigStore,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::email::EmailService;

/// Subscription state of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSetting {
    pub source: NotificationSource,
    pub enabled: bool,
    pub channels: Vec<ChannelSetting>,
}

const SOURCES: [NotificationSource; 3] = [
    NotificationSource::Inbox,
    NotificationSource::AllNewQuestion,
    NotificationSource::AllNewQuestionForFollowingTags,
];

/// Reads and changes subscriptions.
#[derive(Clone)]
pub struct SubscriptionService {
    store: Arc<dyn NotificationConfigStore>,
    email: EmailService,
    id_gen: IdGenerator,
}

impl SubscriptionService {
    #[must_use]
    pub fn new(store: Arc<dyn NotificationConfigStore>, email: EmailService) -> Self {
        Self {
            store,
            email,
            id_gen: IdGenerator::new(),
        }
    }

    /// Settings for every source; unset sources read as disabled.
    pub async fn get_config(&self, user_id: &str) -> AppResult<Vec<SourceSetting>> {
        let rows = self.store.find_user_configs(user_id).await?;
        Ok(SOURCES
            .into_iter()
            .map(|source| {
                rows.iter().find(|r| r.source == source).map_or_else(
                    || SourceSetting {
                        source,
                        enabled: false,
                        channels: vec![ChannelSetting {
                            key: NotificationChannel::Email,
                            enable: false,
                        }],
                    },
                    |row| SourceSetting {
                        source,
                        enabled: row.enabled,
                        channels: row.channel_settings(),
                    },
                )
            })
            .collect())
    }

    /// Replace the settings of the given sources.
    pub async fn update_config(&self, user_id: &str, settings: Vec<SourceSetting>) -> AppResult<Vec<SourceSetting>> {
        for setting in settings {
            self.save(user_id, setting).await?;
        }
        self.get_config(user_id).await
    }

    async fn save(&self, user_id: &str, setting: SourceSetting) -> AppResult<()> {
        let channels = serde_json::to_value(&setting.channels)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        self.store
            .upsert_config(user_notification_config::Model {
                id: self.id_gen.generate(),
                user_id: user_id.to_string(),
                source: setting.source,
                channels,
                enabled: setting.enabled,
                updated_at: Utc::now().into(),
            })
            .await
    }

    /// Switch a source off with a code from a notification mail.
    pub async fn unsubscribe(&self, code: &str) -> AppResult<()> {
        let Some(target) = self.email.redeem_unsubscribe_code(code).await? else {
            return Err(AppError::BadRequest(
                "unsubscribe code is invalid or expired".to_string(),
            ));
        };
        let channels = self
            .store
            .find_user_configs(&target.user_id)
            .await?
            .into_iter()
            .find(|r| r.source == target.source)
            .map(|r| r.channel_settings())
            .unwrap_or_default();
        self.save(
            &target.user_id,
            SourceSetting {
                source: target.source,
                enabled: false,
                channels,
            },
        )
        .await?;
        info!(user_id = %target.user_id, source = ?target.source, "Unsubscribed via mail link");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::i18n::Translator;
    use crate::services::site_info::SiteInfoService;
    use crate::testing::{MemoryStore, seeded_store};
    use crate::validation::Validator;
    use agora_common::{MemoryCache, SharedCache};

    fn service() -> (Arc<MemoryStore>, SubscriptionService) {
        let store = seeded_store();
        let cache: SharedCache = Arc::new(MemoryCache::new());
        let translator = Arc::new(Translator::new());
        let site_info = SiteInfoService::new(
            store.clone(),
            cache.clone(),
            Duration::from_secs(60),
            Validator::new(translator.clone()),
        );
        let email = EmailService::new(
            site_info,
            cache,
            translator,
            "https://qa.example.com",
            "Agora",
            Duration::from_secs(60),
        );
        (store.clone(), SubscriptionService::new(store, email))
    }

    fn email_on(source: NotificationSource) -> SourceSetting {
        SourceSetting {
            source,
            enabled: true,
            channels: vec![ChannelSetting {
                key: NotificationChannel::Email,
                enable: true,
            }],
        }
    }

    #[tokio::test]
    async fn test_defaults_are_off() {
        let (_, service) = service();
        let config = service.get_config("u1").await.unwrap();
        assert_eq!(config.len(), 3);
        assert!(config.iter().all(|s| !s.enabled));
    }

    #[tokio::test]
    async fn test_update_then_unsubscribe() {
        let (store, service) = service();
        service
            .update_config("u1", vec![email_on(NotificationSource::AllNewQuestion)])
            .await
            .unwrap();
        let subscribers = store
            .find_source_subscribers(NotificationSource::AllNewQuestion, None)
            .await
            .unwrap();
        assert_eq!(subscribers.len(), 1);

        let code = service
            .email
            .unsubscribe_code("u1", NotificationSource::AllNewQuestion)
            .await
            .unwrap();
        service.unsubscribe(&code).await.unwrap();

        let subscribers = store
            .find_source_subscribers(NotificationSource::AllNewQuestion, None)
            .await
            .unwrap();
        assert!(subscribers.is_empty());
        assert!(matches!(
            service.unsubscribe(&code).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
