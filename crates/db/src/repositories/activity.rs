//! Activity ledger repository.

use std::sync::Arc;

use crate::entities::{Activity, activity};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};

/// Identity of one ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityLookup {
    pub user_id: String,
    pub object_id: String,
    pub activity_type: i32,
    /// Empty when the affected user acted themselves.
    pub trigger_user_id: String,
}

/// Per-user aggregate row of leaderboard queries.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct UserAmount {
    pub user_id: String,
    pub amount: i64,
}

/// Storage operations of the activity ledger.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Find the row for a key, cancelled or not.
    async fn find_activity(&self, lookup: &ActivityLookup) -> AppResult<Option<activity::Model>>;

    /// Insert a row. Returns `false` if a row with the same key already exists.
    async fn insert_activity(&self, model: activity::Model) -> AppResult<bool>;

    /// Set the cancelled flag. Returns `true` only if the flag changed.
    async fn set_activity_cancelled(&self, id: &str, cancelled: bool) -> AppResult<bool>;

    /// Sum of rank over active rows of a user on an object.
    async fn sum_rank(&self, user_id: &str, object_id: &str) -> AppResult<i64>;

    /// Users with the highest rank gain in a window.
    ///
    /// Windows match on `updated_at`, the time an active row last became
    /// active.
    async fn top_gainers(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<UserAmount>>;

    /// Users with the most active rows of the given types in a window.
    async fn top_voters(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        activity_types: &[i32],
        limit: u64,
    ) -> AppResult<Vec<UserAmount>>;

    /// Count active rows of the given types.
    async fn count_activities(&self, activity_types: &[i32]) -> AppResult<u64>;
}

/// Activity repository for database operations.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityStore for ActivityRepository {
    async fn find_activity(&self, lookup: &ActivityLookup) -> AppResult<Option<activity::Model>> {
        Activity::find()
            .filter(activity::Column::UserId.eq(&lookup.user_id))
            .filter(activity::Column::ObjectId.eq(&lookup.object_id))
            .filter(activity::Column::ActivityType.eq(lookup.activity_type))
            .filter(activity::Column::TriggerUserId.eq(&lookup.trigger_user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_activity(&self, model: activity::Model) -> AppResult<bool> {
        let active = model.into_active_model().reset_all();
        match Activity::insert(active)
            .exec_without_returning(self.db.as_ref())
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn set_activity_cancelled(&self, id: &str, cancelled: bool) -> AppResult<bool> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = Activity::update_many()
            .col_expr(activity::Column::Cancelled, Expr::value(cancelled))
            .col_expr(
                activity::Column::CancelledAt,
                Expr::value(cancelled.then_some(now)),
            )
            .col_expr(activity::Column::UpdatedAt, Expr::value(now))
            .filter(activity::Column::Id.eq(id))
            .filter(activity::Column::Cancelled.eq(!cancelled))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    async fn sum_rank(&self, user_id: &str, object_id: &str) -> AppResult<i64> {
        #[derive(FromQueryResult)]
        struct SumResult {
            total: Option<i64>,
        }

        let result = Activity::find()
            .filter(activity::Column::UserId.eq(user_id))
            .filter(activity::Column::ObjectId.eq(object_id))
            .filter(activity::Column::Cancelled.eq(false))
            .select_only()
            .column_as(activity::Column::Rank.sum(), "total")
            .into_model::<SumResult>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.and_then(|r| r.total).unwrap_or(0))
    }

    async fn top_gainers(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<UserAmount>> {
        Activity::find()
            .select_only()
            .column(activity::Column::UserId)
            .column_as(activity::Column::Rank.sum(), "amount")
            .filter(activity::Column::HasRank.eq(true))
            .filter(activity::Column::Cancelled.eq(false))
            .filter(activity::Column::UpdatedAt.between(start, end))
            .group_by(activity::Column::UserId)
            .order_by_desc(activity::Column::Rank.sum())
            .order_by_asc(activity::Column::UserId)
            .limit(limit)
            .into_model::<UserAmount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn top_voters(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        activity_types: &[i32],
        limit: u64,
    ) -> AppResult<Vec<UserAmount>> {
        if activity_types.is_empty() {
            return Ok(vec![]);
        }

        Activity::find()
            .select_only()
            .column(activity::Column::UserId)
            .column_as(activity::Column::Id.count(), "amount")
            .filter(activity::Column::ActivityType.is_in(activity_types.to_vec()))
            .filter(activity::Column::Cancelled.eq(false))
            .filter(activity::Column::UpdatedAt.between(start, end))
            .group_by(activity::Column::UserId)
            .order_by_desc(activity::Column::Id.count())
            .order_by_asc(activity::Column::UserId)
            .limit(limit)
            .into_model::<UserAmount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn count_activities(&self, activity_types: &[i32]) -> AppResult<u64> {
        if activity_types.is_empty() {
            return Ok(0);
        }

        Activity::find()
            .filter(activity::Column::ActivityType.is_in(activity_types.to_vec()))
            .filter(activity::Column::Cancelled.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_activity(id: &str, cancelled: bool) -> activity::Model {
        let now = Utc::now().into();
        activity::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            trigger_user_id: String::new(),
            object_id: "q1".to_string(),
            original_object_id: "q1".to_string(),
            activity_type: 5,
            rank: 0,
            has_rank: false,
            cancelled,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn lookup() -> ActivityLookup {
        ActivityLookup {
            user_id: "u1".to_string(),
            object_id: "q1".to_string(),
            activity_type: 5,
            trigger_user_id: String::new(),
        }
    }

    #[tokio::test]
    async fn test_find_activity() {
        let row = create_test_activity("a1", false);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row.clone()]])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        let found = repo.find_activity(&lookup()).await.unwrap();

        assert_eq!(found, Some(row));
    }

    #[tokio::test]
    async fn test_insert_activity() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        let inserted = repo
            .insert_activity(create_test_activity("a1", false))
            .await
            .unwrap();

        assert!(inserted);
    }

    #[tokio::test]
    async fn test_set_cancelled_reports_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        assert!(repo.set_activity_cancelled("a1", true).await.unwrap());
        assert!(!repo.set_activity_cancelled("a1", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_sum_rank_defaults_to_zero() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "total" => sea_orm::Value::BigInt(None)
                }]])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        assert_eq!(repo.sum_rank("u1", "q1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_top_gainers_maps_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "user_id" => sea_orm::Value::String(Some(Box::new("u2".to_string()))),
                        "amount" => sea_orm::Value::BigInt(Some(30)),
                    },
                    maplit::btreemap! {
                        "user_id" => sea_orm::Value::String(Some(Box::new("u1".to_string()))),
                        "amount" => sea_orm::Value::BigInt(Some(10)),
                    },
                ]])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        let end = Utc::now();
        let start = end - chrono::Duration::days(7);
        let rows = repo.top_gainers(start, end, 2).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "u2");
        assert_eq!(rows[0].amount, 30);
    }

    #[tokio::test]
    async fn test_top_voters_without_types_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = ActivityRepository::new(db);
        let end = Utc::now();
        let rows = repo
            .top_voters(end - chrono::Duration::days(1), end, &[], 10)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
