//! Tag repository.

use std::sync::Arc;

use crate::entities::{Tag, TagRel, tag, tag_rel};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, sea_query::OnConflict,
};

/// Storage operations on tags and question/tag links.
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn find_tags_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<tag::Model>>;

    async fn insert_tag(&self, model: tag::Model) -> AppResult<tag::Model>;

    /// Tag ids attached to a question.
    async fn find_question_tag_ids(&self, question_id: &str) -> AppResult<Vec<String>>;

    /// Attach tags to a question; existing links are kept.
    async fn link_question_tags(&self, links: Vec<tag_rel::Model>) -> AppResult<()>;
}

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagStore for TagRepository {
    async fn find_tags_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<tag::Model>> {
        if slugs.is_empty() {
            return Ok(vec![]);
        }

        Tag::find()
            .filter(tag::Column::SlugName.is_in(slugs.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_tag(&self, model: tag::Model) -> AppResult<tag::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_question_tag_ids(&self, question_id: &str) -> AppResult<Vec<String>> {
        TagRel::find()
            .filter(tag_rel::Column::ObjectId.eq(question_id))
            .select_only()
            .column(tag_rel::Column::TagId)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn link_question_tags(&self, links: Vec<tag_rel::Model>) -> AppResult<()> {
        if links.is_empty() {
            return Ok(());
        }

        TagRel::insert_many(
            links
                .into_iter()
                .map(|l| l.into_active_model().reset_all()),
        )
        .on_conflict(
            OnConflict::columns([tag_rel::Column::ObjectId, tag_rel::Column::TagId])
                .do_nothing()
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
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_question_tag_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "tag_id" => sea_orm::Value::String(Some(Box::new("t1".to_string())))
                    },
                    maplit::btreemap! {
                        "tag_id" => sea_orm::Value::String(Some(Box::new("t2".to_string())))
                    },
                ]])
                .into_connection(),
        );

        let repo = TagRepository::new(db);
        let ids = repo.find_question_tag_ids("q1").await.unwrap();

        assert_eq!(ids, vec!["t1".to_string(), "t2".to_string()]);
    }

    #[tokio::test]
    async fn test_link_nothing_is_noop() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = TagRepository::new(db);
        repo.link_question_tags(vec![]).await.unwrap();
    }
}
