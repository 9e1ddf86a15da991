//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, sea_query::Expr,
};

/// Storage operations on users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> AppResult<Option<user::Model>>;

    async fn find_user_by_token(&self, token: &str) -> AppResult<Option<user::Model>>;

    async fn find_users(&self, ids: &[String]) -> AppResult<Vec<user::Model>>;

    /// Add `delta` to the user's reputation total.
    async fn add_user_rank(&self, id: &str, delta: i32) -> AppResult<()>;

    /// Count users that are not deleted.
    async fn count_users(&self) -> AppResult<u64>;
}

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::AccessToken.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_users(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn add_user_rank(&self, id: &str, delta: i32) -> AppResult<()> {
        if delta == 0 {
            return Ok(());
        }

        User::update_many()
            .col_expr(user::Column::Rank, Expr::col(user::Column::Rank).add(delta))
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count_users(&self) -> AppResult<u64> {
        User::find()
            .filter(user::Column::Status.ne(user::UserStatus::Deleted))
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

    fn create_test_user(id: &str, token: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            display_name: format!("User {id}"),
            email: format!("{id}@example.com"),
            language: "en_US".to_string(),
            role: user::UserRole::User,
            rank: 1,
            status: user::UserStatus::Available,
            mail_status: user::MailStatus::Available,
            access_token: Some(token.to_string()),
            question_count: 0,
            answer_count: 0,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_user_by_token() {
        let user = create_test_user("u1", "tok");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_user_by_token("tok").await.unwrap();

        assert_eq!(found.map(|u| u.id), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn test_find_users_empty_ids() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = UserRepository::new(db);
        assert!(repo.find_users(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_user_rank_issues_update() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        repo.add_user_rank("u1", 10).await.unwrap();
        // Zero delta never reaches the database.
        repo.add_user_rank("u1", 0).await.unwrap();
    }
}
