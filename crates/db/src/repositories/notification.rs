//! Inbox notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Storage operations on inbox notifications.
#[async_trait]
pub trait InboxStore: Send + Sync {
    async fn insert_notification(&self, model: notification::Model) -> AppResult<()>;

    /// Newest notifications of a user.
    async fn find_user_notifications(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>>;
}

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InboxStore for NotificationRepository {
    async fn insert_notification(&self, model: notification::Model) -> AppResult<()> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn find_user_notifications(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_user_notifications() {
        let row = notification::Model {
            id: "n1".to_string(),
            user_id: "u1".to_string(),
            trigger_user_id: None,
            object_id: "103abc".to_string(),
            object_type: "comment".to_string(),
            action: notification::InboxAction::YourCommentWasDeleted,
            is_read: false,
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row.clone()]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let rows = repo.find_user_notifications("u1", 20).await.unwrap();

        assert_eq!(rows, vec![row]);
    }
}
