//! Follow repository.

use std::sync::Arc;

use crate::entities::{Follow, follow};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, sea_query::OnConflict,
};

/// Storage operations on follows.
#[async_trait]
pub trait FollowStore: Send + Sync {
    /// Distinct ids of users following any of the objects.
    async fn find_follower_ids(&self, object_ids: &[String]) -> AppResult<Vec<String>>;

    /// Record a follow; following twice is a no-op.
    async fn insert_follow(&self, model: follow::Model) -> AppResult<()>;

    /// Remove a follow; returns whether one existed.
    async fn delete_follow(&self, user_id: &str, object_id: &str) -> AppResult<bool>;
}

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FollowStore for FollowRepository {
    async fn find_follower_ids(&self, object_ids: &[String]) -> AppResult<Vec<String>> {
        if object_ids.is_empty() {
            return Ok(vec![]);
        }

        Follow::find()
            .filter(follow::Column::ObjectId.is_in(object_ids.to_vec()))
            .select_only()
            .column(follow::Column::UserId)
            .distinct()
            .order_by_asc(follow::Column::UserId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_follow(&self, model: follow::Model) -> AppResult<()> {
        Follow::insert(model.into_active_model().reset_all())
            .on_conflict(
                OnConflict::columns([follow::Column::UserId, follow::Column::ObjectId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_follow(&self, user_id: &str, object_id: &str) -> AppResult<bool> {
        let result = Follow::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::ObjectId.eq(object_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}
