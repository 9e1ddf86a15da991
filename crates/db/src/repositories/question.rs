//! Question repository.

use std::sync::Arc;

use crate::entities::{Question, question};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, sea_query::Expr,
};

/// Storage operations on questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn find_question(&self, id: &str) -> AppResult<Option<question::Model>>;

    async fn insert_question(&self, model: question::Model) -> AppResult<question::Model>;

    /// Overwrite an existing row. Counter columns are left to the `add_*`
    /// methods and come back as stored.
    async fn update_question(&self, model: question::Model) -> AppResult<question::Model>;

    /// Add `delta` to the vote counter in place and return the new value.
    async fn add_question_vote_count(&self, id: &str, delta: i32) -> AppResult<Option<i32>>;

    /// Add `delta` to the answer counter in place; it never drops below zero.
    async fn add_answer_count(&self, id: &str, delta: i32) -> AppResult<()>;

    /// Count rows that are not deleted.
    async fn count_questions(&self) -> AppResult<u64>;
}

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuestionStore for QuestionRepository {
    async fn find_question(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_question(&self, model: question::Model) -> AppResult<question::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_question(&self, model: question::Model) -> AppResult<question::Model> {
        let mut active = model.into_active_model().reset_all();
        active.view_count = NotSet;
        active.vote_count = NotSet;
        active.answer_count = NotSet;
        active.collection_count = NotSet;
        active.follow_count = NotSet;

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn add_question_vote_count(&self, id: &str, delta: i32) -> AppResult<Option<i32>> {
        if delta != 0 {
            Question::update_many()
                .col_expr(
                    question::Column::VoteCount,
                    Expr::col(question::Column::VoteCount).add(delta),
                )
                .filter(question::Column::Id.eq(id))
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Ok(self.find_question(id).await?.map(|row| row.vote_count))
    }

    async fn add_answer_count(&self, id: &str, delta: i32) -> AppResult<()> {
        if delta == 0 {
            return Ok(());
        }

        Question::update_many()
            .col_expr(
                question::Column::AnswerCount,
                Expr::col(question::Column::AnswerCount).add(delta),
            )
            .filter(question::Column::Id.eq(id))
            .filter(question::Column::AnswerCount.gte(-delta))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count_questions(&self) -> AppResult<u64> {
        Question::find()
            .filter(question::Column::Status.ne(question::ContentStatus::Deleted))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_question(id: &str) -> question::Model {
        let now = Utc::now().into();
        question::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: "How do lifetimes work?".to_string(),
            original_text: "body".to_string(),
            status: question::ContentStatus::Available,
            pin: question::PinState::Unpinned,
            show: question::ShowState::Shown,
            view_count: 0,
            vote_count: 0,
            answer_count: 0,
            collection_count: 0,
            follow_count: 0,
            accepted_answer_id: None,
            close_msg: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_question() {
        let question = create_test_question("q1");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question.clone()]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let found = repo.find_question("q1").await.unwrap();

        assert_eq!(found, Some(question));
    }

    #[tokio::test]
    async fn test_update_question_returns_row() {
        let mut question = create_test_question("q1");
        question.status = question::ContentStatus::Closed;
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question.clone()]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let updated = repo.update_question(question).await.unwrap();

        assert_eq!(updated.status, question::ContentStatus::Closed);
    }

    #[tokio::test]
    async fn test_add_question_vote_count_reads_back_counter() {
        let mut question = create_test_question("q1");
        question.vote_count = 3;
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[question]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        assert_eq!(repo.add_question_vote_count("q1", 1).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_add_answer_count_skips_zero_delta() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        repo.add_answer_count("q1", -1).await.unwrap();
        // Zero delta never reaches the database.
        repo.add_answer_count("q1", 0).await.unwrap();
    }

    #[tokio::test]
    async fn test_count_questions() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        assert_eq!(repo.count_questions().await.unwrap(), 12);
    }
}
