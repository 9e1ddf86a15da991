//! Site settings repository.

use std::sync::Arc;

use crate::entities::{
    SiteInfo,
    site_info::{self, SiteInfoType},
};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
};

/// Storage operations on site settings.
#[async_trait]
pub trait SiteInfoStore: Send + Sync {
    async fn find_site_info(&self, site_type: SiteInfoType) -> AppResult<Option<site_info::Model>>;

    async fn insert_site_info(&self, model: site_info::Model) -> AppResult<site_info::Model>;

    async fn update_site_info(&self, model: site_info::Model) -> AppResult<site_info::Model>;
}

/// Site info repository for database operations.
#[derive(Clone)]
pub struct SiteInfoRepository {
    db: Arc<DatabaseConnection>,
}

impl SiteInfoRepository {
    /// Create a new site info repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SiteInfoStore for SiteInfoRepository {
    async fn find_site_info(&self, site_type: SiteInfoType) -> AppResult<Option<site_info::Model>> {
        SiteInfo::find()
            .filter(site_info::Column::SiteType.eq(site_type))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn insert_site_info(&self, model: site_info::Model) -> AppResult<site_info::Model> {
        model
            .into_active_model()
            .reset_all()
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_site_info(&self, model: site_info::Model) -> AppResult<site_info::Model> {
        model
            .into_active_model()
            .reset_all()
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
