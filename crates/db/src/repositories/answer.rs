//! Answer repository.

use std::sync::Arc;

use crate::entities::{Answer, answer};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, sea_query::Expr,
};

/// Storage operations on answers.
#[async_trait]
pub trait AnswerStore: Send + Sync {
    async fn find_answer(&self, id: &str) -> AppResult<Option<answer::Model>>;

    async fn insert_answer(&self, model: answer::Model) -> AppResult<answer::Model>;

    /// Overwrite an existing row. Counter columns are left to the `add_*`
    /// methods and come back as stored.
    async fn update_answer(&self, model: answer::Model) -> AppResult<answer::Model>;

    /// Add `delta` to the vote counter in place and return the new value.
    async fn add_answer_vote_count(&self, id: &str, delta: i32) -> AppResult<Option<i32>>;

    /// Count rows that are not deleted.
    async fn count_answers(&self) -> AppResult<u64>;
}

/// Answer repository for database operations.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AnswerStore for AnswerRepository {
    async fn find_answer(&self, id: &str) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_answer(&self, model: answer::Model) -> AppResult<answer::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_answer(&self, model: answer::Model) -> AppResult<answer::Model> {
        let mut active = model.into_active_model().reset_all();
        active.vote_count = NotSet;

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn add_answer_vote_count(&self, id: &str, delta: i32) -> AppResult<Option<i32>> {
        if delta != 0 {
            Answer::update_many()
                .col_expr(
                    answer::Column::VoteCount,
                    Expr::col(answer::Column::VoteCount).add(delta),
                )
                .filter(answer::Column::Id.eq(id))
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Ok(self.find_answer(id).await?.map(|row| row.vote_count))
    }

    async fn count_answers(&self) -> AppResult<u64> {
        Answer::find()
            .filter(answer::Column::Status.ne(answer::ContentStatus::Deleted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
