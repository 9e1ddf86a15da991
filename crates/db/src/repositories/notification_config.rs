//! Notification subscription repository.

use std::sync::Arc;

use crate::entities::{
    UserNotificationConfig,
    user_notification_config::{self, NotificationSource},
};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, sea_query::OnConflict,
};

/// Storage operations on notification subscriptions.
#[async_trait]
pub trait NotificationConfigStore: Send + Sync {
    /// Enabled subscriptions of a source, optionally limited to some users.
    async fn find_source_subscribers(
        &self,
        source: NotificationSource,
        user_ids: Option<&[String]>,
    ) -> AppResult<Vec<user_notification_config::Model>>;

    /// Every subscription row of one user.
    async fn find_user_configs(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<user_notification_config::Model>>;

    /// Insert or replace the row for `(user_id, source)`.
    async fn upsert_config(&self, model: user_notification_config::Model) -> AppResult<()>;
}

/// Notification config repository for database operations.
#[derive(Clone)]
pub struct NotificationConfigRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationConfigRepository {
    /// Create a new notification config repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationConfigStore for NotificationConfigRepository {
    async fn find_source_subscribers(
        &self,
        source: NotificationSource,
        user_ids: Option<&[String]>,
    ) -> AppResult<Vec<user_notification_config::Model>> {
        let mut query = UserNotificationConfig::find()
            .filter(user_notification_config::Column::Source.eq(source))
            .filter(user_notification_config::Column::Enabled.eq(true));

        if let Some(ids) = user_ids {
            if ids.is_empty() {
                return Ok(vec![]);
            }
            query = query.filter(user_notification_config::Column::UserId.is_in(ids.to_vec()));
        }

        query
            .order_by_asc(user_notification_config::Column::UserId)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_configs(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<user_notification_config::Model>> {
        UserNotificationConfig::find()
            .filter(user_notification_config::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_config(&self, model: user_notification_config::Model) -> AppResult<()> {
        UserNotificationConfig::insert(model.into_active_model().reset_all())
            .on_conflict(
                OnConflict::columns([
                    user_notification_config::Column::UserId,
                    user_notification_config::Column::Source,
                ])
                .update_columns([
                    user_notification_config::Column::Channels,
                    user_notification_config::Column::Enabled,
                    user_notification_config::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_config(user_id: &str) -> user_notification_config::Model {
        user_notification_config::Model {
            id: format!("c_{user_id}"),
            user_id: user_id.to_string(),
            source: NotificationSource::AllNewQuestion,
            channels: serde_json::json!([{ "key": "email", "enable": true }]),
            enabled: true,
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_source_subscribers() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_config("u1"), create_test_config("u2")]])
                .into_connection(),
        );

        let repo = NotificationConfigRepository::new(db);
        let rows = repo
            .find_source_subscribers(NotificationSource::AllNewQuestion, None)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_find_source_subscribers_empty_filter() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = NotificationConfigRepository::new(db);
        let rows = repo
            .find_source_subscribers(NotificationSource::Inbox, Some(&[]))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_config() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = NotificationConfigRepository::new(db);
        repo.upsert_config(create_test_config("u1")).await.unwrap();
    }
}
