//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter,
};

/// Storage operations on comments.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn find_comment(&self, id: &str) -> AppResult<Option<comment::Model>>;

    async fn insert_comment(&self, model: comment::Model) -> AppResult<comment::Model>;

    /// Overwrite every column of an existing row.
    async fn update_comment(&self, model: comment::Model) -> AppResult<comment::Model>;

    /// Count rows that are not deleted.
    async fn count_comments(&self) -> AppResult<u64>;
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentStore for CommentRepository {
    async fn find_comment(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_comment(&self, model: comment::Model) -> AppResult<comment::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_comment(&self, model: comment::Model) -> AppResult<comment::Model> {
        model
            .into_active_model()
            .reset_all()
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_comments(&self) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::Status.ne(comment::ContentStatus::Deleted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
