//! Site settings with a cache-aside read path.

use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppError, AppResult, IdGenerator, SharedCache};
use agora_db::{
    entities::site_info::{self, SiteInfoType},
    repositories::SiteInfoStore,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::site_sections::{
    SiteBranding, SiteCustomCssHtml, SiteGeneral, SiteInterface, SiteLegal, SiteLogin,
    SitePrivileges, SiteSection, SiteSeo, SiteTheme, SiteUsers, SiteWrite,
};
use crate::validation::Validator;

fn cache_key(site_type: SiteInfoType) -> String {
    format!("site_info:{}", site_type.as_str())
}

/// Settings visible to anonymous visitors.
#[derive(Debug, Clone, Serialize)]
pub struct SiteInfoResponse {
    pub general: SiteGeneral,
    pub interface: SiteInterface,
    pub branding: SiteBranding,
    pub login: SiteLogin,
    pub theme: SiteTheme,
    pub seo: SiteSeo,
    pub users: SiteUsers,
    pub write: SiteWrite,
    pub custom_css_html: SiteCustomCssHtml,
    pub version: &'static str,
}

/// Site settings service.
#[derive(Clone)]
pub struct SiteInfoService {
    store: Arc<dyn SiteInfoStore>,
    cache: SharedCache,
    ttl: Duration,
    validator: Validator,
    id_gen: IdGenerator,
}

impl SiteInfoService {
    #[must_use]
    pub fn new(
        store: Arc<dyn SiteInfoStore>,
        cache: SharedCache,
        ttl: Duration,
        validator: Validator,
    ) -> Self {
        Self {
            store,
            cache,
            ttl,
            validator,
            id_gen: IdGenerator::new(),
        }
    }

    /// Read a settings row, cache first.
    ///
    /// Cache failures fall through to the database.
    pub async fn get_by_type(&self, site_type: SiteInfoType) -> AppResult<Option<site_info::Model>> {
        let key = cache_key(site_type);
        match self.cache.get_string(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<site_info::Model>(&raw) {
                Ok(row) => return Ok(Some(row)),
                Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cached site info"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Site info cache read failed"),
        }

        let row = self.store.find_site_info(site_type).await?;
        if let Some(row) = &row {
            self.write_cache(row).await;
        }
        Ok(row)
    }

    /// Upsert a settings row and overwrite its cache entry.
    pub async fn save_by_type(
        &self,
        site_type: SiteInfoType,
        content: String,
    ) -> AppResult<site_info::Model> {
        let now = Utc::now().into();
        let row = match self.store.find_site_info(site_type).await? {
            Some(mut row) => {
                row.content = content;
                row.status = 1;
                row.updated_at = now;
                self.store.update_site_info(row).await?
            }
            None => {
                self.store
                    .insert_site_info(site_info::Model {
                        id: self.id_gen.generate(),
                        site_type,
                        content,
                        status: 1,
                        created_at: now,
                        updated_at: now,
                    })
                    .await?
            }
        };
        self.write_cache(&row).await;
        debug!(site_type = %site_type.as_str(), "Site info saved");
        Ok(row)
    }

    async fn write_cache(&self, row: &site_info::Model) {
        let key = cache_key(row.site_type);
        let raw = match serde_json::to_string(row) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode site info for cache");
                return;
            }
        };
        if let Err(e) = self.cache.set_string(&key, &raw, self.ttl).await {
            warn!(key = %key, error = %e, "Site info cache write failed");
            // A stale entry must not outlive the write.
            if let Err(e) = self.cache.del(&key).await {
                warn!(key = %key, error = %e, "Site info cache delete failed");
            }
        }
    }

    /// Typed section; defaults when the row is missing or unreadable.
    pub async fn get_section<T: SiteSection>(&self) -> AppResult<T> {
        let Some(row) = self.get_by_type(T::TYPE).await? else {
            return Ok(T::default());
        };
        Ok(serde_json::from_str(&row.content).unwrap_or_else(|e| {
            warn!(site_type = %T::TYPE.as_str(), error = %e, "Unreadable site info, using defaults");
            T::default()
        }))
    }

    /// Validate, normalise and store a typed section.
    pub async fn save_section<T: SiteSection>(&self, mut value: T, language: &str) -> AppResult<T> {
        self.validator.check(&value, language)?;
        value.normalize()?;
        let content =
            serde_json::to_string(&value).map_err(|e| AppError::Internal(e.to_string()))?;
        self.save_by_type(T::TYPE, content).await?;
        Ok(value)
    }

    /// Section as JSON, for the admin API.
    pub async fn get_raw(&self, site_type: SiteInfoType) -> AppResult<Value> {
        match site_type {
            SiteInfoType::General => to_json(&self.get_section::<SiteGeneral>().await?),
            SiteInfoType::Interface => to_json(&self.get_section::<SiteInterface>().await?),
            SiteInfoType::Branding => to_json(&self.get_section::<SiteBranding>().await?),
            SiteInfoType::Login => to_json(&self.get_section::<SiteLogin>().await?),
            SiteInfoType::Theme => to_json(&self.get_section::<SiteTheme>().await?),
            SiteInfoType::Seo => to_json(&self.get_section::<SiteSeo>().await?),
            SiteInfoType::Users => to_json(&self.get_section::<SiteUsers>().await?),
            SiteInfoType::Write => to_json(&self.get_section::<SiteWrite>().await?),
            SiteInfoType::Privileges => to_json(&self.get_section::<SitePrivileges>().await?),
            SiteInfoType::Legal => to_json(&self.get_section::<SiteLegal>().await?),
            SiteInfoType::CssHtml => to_json(&self.get_section::<SiteCustomCssHtml>().await?),
        }
    }

    /// Store a section sent as JSON, for the admin API.
    pub async fn save_raw(
        &self,
        site_type: SiteInfoType,
        value: Value,
        language: &str,
    ) -> AppResult<Value> {
        match site_type {
            SiteInfoType::General => self.save_json::<SiteGeneral>(value, language).await,
            SiteInfoType::Interface => self.save_json::<SiteInterface>(value, language).await,
            SiteInfoType::Branding => self.save_json::<SiteBranding>(value, language).await,
            SiteInfoType::Login => self.save_json::<SiteLogin>(value, language).await,
            SiteInfoType::Theme => self.save_json::<SiteTheme>(value, language).await,
            SiteInfoType::Seo => self.save_json::<SiteSeo>(value, language).await,
            SiteInfoType::Users => self.save_json::<SiteUsers>(value, language).await,
            SiteInfoType::Write => self.save_json::<SiteWrite>(value, language).await,
            SiteInfoType::Privileges => self.save_json::<SitePrivileges>(value, language).await,
            SiteInfoType::Legal => self.save_json::<SiteLegal>(value, language).await,
            SiteInfoType::CssHtml => self.save_json::<SiteCustomCssHtml>(value, language).await,
        }
    }

    async fn save_json<T: SiteSection>(&self, value: Value, language: &str) -> AppResult<Value> {
        let section: T = serde_json::from_value(value)
            .map_err(|e| AppError::BadRequest(format!("invalid site info: {e}")))?;
        to_json(&self.save_section(section, language).await?)
    }

    /// Everything the public site-info endpoint returns.
    pub async fn public_info(&self) -> AppResult<SiteInfoResponse> {
        Ok(SiteInfoResponse {
            general: self.get_section().await?,
            interface: self.get_section().await?,
            branding: self.get_section().await?,
            login: self.get_section().await?,
            theme: self.get_section().await?,
            seo: self.get_section().await?,
            users: self.get_section().await?,
            write: self.get_section().await?,
            custom_css_html: self.get_section().await?,
            version: env!("CARGO_PKG_VERSION"),
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::i18n::Translator;
    use crate::testing::{MemoryStore, seeded_store};
    use agora_common::MemoryCache;

    fn service(store: Arc<MemoryStore>) -> SiteInfoService {
        SiteInfoService::new(
            store,
            Arc::new(MemoryCache::new()),
            Duration::from_secs(3600),
            Validator::new(Arc::new(Translator::new())),
        )
    }

    #[tokio::test]
    async fn test_missing_row_is_none() {
        let service = service(seeded_store());
        assert!(service.get_by_type(SiteInfoType::General).await.unwrap().is_none());
        let general: SiteGeneral = service.get_section().await.unwrap();
        assert_eq!(general, SiteGeneral::default());
    }

    #[tokio::test]
    async fn test_save_then_get_prefers_cache() {
        let store = seeded_store();
        let service = service(store.clone());
        service
            .save_by_type(SiteInfoType::Legal, r#"{"terms_of_service":"v2"}"#.to_string())
            .await
            .unwrap();

        // The database goes stale; the cached row still wins.
        store
            .overwrite_site_info(SiteInfoType::Legal, r#"{"terms_of_service":"stale"}"#)
            .await;
        let legal: SiteLegal = service.get_section().await.unwrap();
        assert_eq!(legal.terms_of_service, "v2");
    }

    #[tokio::test]
    async fn test_save_updates_existing_row() {
        let store = seeded_store();
        let service = service(store.clone());
        let first = service
            .save_by_type(SiteInfoType::Theme, "{}".to_string())
            .await
            .unwrap();
        let second = service
            .save_by_type(SiteInfoType::Theme, r#"{"theme":"dark"}"#.to_string())
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        let stored = store.find_site_info(SiteInfoType::Theme).await.unwrap().unwrap();
        assert_eq!(stored.content, r#"{"theme":"dark"}"#);
    }

    #[tokio::test]
    async fn test_save_raw_normalizes_and_validates() {
        let service = service(seeded_store());
        let saved = service
            .save_raw(
                SiteInfoType::General,
                serde_json::json!({
                    "name": "Agora",
                    "site_url": "https://qa.example.com/",
                    "contact_email": "admin@example.com"
                }),
                "en_US",
            )
            .await
            .unwrap();
        assert_eq!(saved["site_url"], "https://qa.example.com");

        let err = service
            .save_raw(
                SiteInfoType::General,
                serde_json::json!({ "name": "", "site_url": "nope", "contact_email": "x" }),
                "en_US",
            )
            .await
            .unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error, got {err:?}");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, ["contact_email", "name", "site_url"]);
    }

    #[tokio::test]
    async fn test_save_raw_rejects_wrong_shape() {
        let service = service(seeded_store());
        let err = service
            .save_raw(SiteInfoType::Seo, serde_json::json!({ "permalink": "one" }), "en_US")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
