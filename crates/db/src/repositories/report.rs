//! Report repository.

use std::sync::Arc;

use crate::entities::{
    Report,
    report::{self, ReportStatus},
};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Filter for the moderation queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    /// `question`, `answer` or `comment`.
    pub object_type: Option<String>,
}

/// Storage operations on reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_report(&self, model: report::Model) -> AppResult<report::Model>;

    async fn find_report(&self, id: &str) -> AppResult<Option<report::Model>>;

    async fn update_report(&self, model: report::Model) -> AppResult<report::Model>;

    /// Page of reports, newest first, with the total count of the filter.
    async fn list_reports(
        &self,
        filter: &ReportFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<report::Model>, u64)>;

    /// Count reports in a status.
    async fn count_reports(&self, status: ReportStatus) -> AppResult<u64>;
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn filtered(filter: &ReportFilter) -> sea_orm::Select<Report> {
        let mut query = Report::find();
        if let Some(status) = filter.status {
            query = query.filter(report::Column::Status.eq(status));
        }
        if let Some(object_type) = &filter.object_type {
            query = query.filter(report::Column::ObjectType.eq(object_type.as_str()));
        }
        query
    }
}

#[async_trait]
impl ReportStore for ReportRepository {
    async fn insert_report(&self, model: report::Model) -> AppResult<report::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_report(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_report(&self, model: report::Model) -> AppResult<report::Model> {
        model
            .into_active_model()
            .reset_all()
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<report::Model>, u64)> {
        let total = Self::filtered(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rows = Self::filtered(filter)
            .order_by_desc(report::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((rows, total))
    }

    async fn count_reports(&self, status: ReportStatus) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.eq(status))
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
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_report(id: &str, status: ReportStatus) -> report::Model {
        let now = Utc::now().into();
        report::Model {
            id: id.to_string(),
            user_id: "reporter".to_string(),
            object_id: "q1".to_string(),
            reported_user_id: "author".to_string(),
            object_type: "question".to_string(),
            report_type: report::ReportReason::Spam,
            content: "buy now".to_string(),
            flagged_type: None,
            flagged_content: None,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_report() {
        let report = create_test_report("r1", ReportStatus::Pending);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report.clone()]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        assert_eq!(repo.find_report("r1").await.unwrap(), Some(report));
    }

    #[tokio::test]
    async fn test_list_reports_returns_total() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .append_query_results([[
                    create_test_report("r2", ReportStatus::Pending),
                    create_test_report("r1", ReportStatus::Pending),
                ]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let filter = ReportFilter {
            status: Some(ReportStatus::Pending),
            object_type: None,
        };
        let (rows, total) = repo.list_reports(&filter, 2, 0).await.unwrap();

        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "r2");
    }
}
