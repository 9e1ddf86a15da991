//! Reference configuration repository.

use std::sync::Arc;

use crate::entities::{Config, config};
use agora_common::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

/// Read access to the config table.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Find a config row by key.
    async fn find_config_by_key(&self, key: &str) -> AppResult<Option<config::Model>>;

    /// All rows whose key starts with `prefix`, ordered by id.
    async fn find_configs_by_prefix(&self, prefix: &str) -> AppResult<Vec<config::Model>>;
}

/// Config repository for database operations.
#[derive(Clone)]
pub struct ConfigRepository {
    db: Arc<DatabaseConnection>,
}

impl ConfigRepository {
    /// Create a new config repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfigStore for ConfigRepository {
    async fn find_config_by_key(&self, key: &str) -> AppResult<Option<config::Model>> {
        Config::find()
            .filter(config::Column::Key.eq(key))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_configs_by_prefix(&self, prefix: &str) -> AppResult<Vec<config::Model>> {
        Config::find()
            .filter(config::Column::Key.starts_with(prefix))
            .order_by_asc(config::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
