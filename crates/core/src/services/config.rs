//! Reference data from the config table.
//!
//! Activity types and their rank deltas are seeded by migration and never
//! change at runtime, so rows are kept in process after the first read.

use std::collections::HashMap;
use std::sync::Arc;

use agora_common::{AppError, AppResult};
use agora_db::{entities::config, repositories::ConfigStore};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Every `<object>.<action>` key the ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKey {
    QuestionAsked,
    QuestionClosed,
    QuestionReopened,
    QuestionDeleted,
    QuestionVoteUp,
    QuestionVoteDown,
    QuestionVotedUp,
    QuestionVotedDown,
    QuestionPinned,
    QuestionUnpinned,
    QuestionHidden,
    QuestionShown,
    AnswerAnswered,
    AnswerDeleted,
    AnswerVoteUp,
    AnswerVoteDown,
    AnswerVotedUp,
    AnswerVotedDown,
    CommentCreated,
    CommentDeleted,
}

impl ActivityKey {
    /// Keys counted as votes by leaderboards and the dashboard.
    pub const VOTES: [Self; 4] = [
        Self::QuestionVoteUp,
        Self::QuestionVoteDown,
        Self::AnswerVoteUp,
        Self::AnswerVoteDown,
    ];

    /// Config key of this activity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QuestionAsked => "question.asked",
            Self::QuestionClosed => "question.closed",
            Self::QuestionReopened => "question.reopened",
            Self::QuestionDeleted => "question.deleted",
            Self::QuestionVoteUp => "question.vote_up",
            Self::QuestionVoteDown => "question.vote_down",
            Self::QuestionVotedUp => "question.voted_up",
            Self::QuestionVotedDown => "question.voted_down",
            Self::QuestionPinned => "question.pinned",
            Self::QuestionUnpinned => "question.unpinned",
            Self::QuestionHidden => "question.hidden",
            Self::QuestionShown => "question.shown",
            Self::AnswerAnswered => "answer.answered",
            Self::AnswerDeleted => "answer.deleted",
            Self::AnswerVoteUp => "answer.vote_up",
            Self::AnswerVoteDown => "answer.vote_down",
            Self::AnswerVotedUp => "answer.voted_up",
            Self::AnswerVotedDown => "answer.voted_down",
            Self::CommentCreated => "comment.created",
            Self::CommentDeleted => "comment.deleted",
        }
    }
}

impl std::fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display payload of report reasons and moderator decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonInfo {
    pub name: String,
    pub description: String,
}

/// Read-through access to the config table.
#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    rows: Arc<RwLock<HashMap<String, config::Model>>>,
}

impl ConfigService {
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Row for `key`, `None` if the key is not configured.
    pub async fn get_by_key(&self, key: &str) -> AppResult<Option<config::Model>> {
        if let Some(row) = self.rows.read().await.get(key) {
            return Ok(Some(row.clone()));
        }

        let row = self.store.find_config_by_key(key).await?;
        if let Some(row) = &row {
            debug!(key = %key, "Config row loaded");
            self.rows.write().await.insert(key.to_string(), row.clone());
        }
        Ok(row)
    }

    /// Activity type code and rank delta of an activity.
    pub async fn type_and_rank(&self, key: ActivityKey) -> AppResult<(i32, i32)> {
        let row = self
            .get_by_key(key.as_str())
            .await?
            .ok_or_else(|| AppError::BadRequest("activity type unknown".to_string()))?;
        let rank = row.value.trim().parse::<i32>().map_err(|e| {
            AppError::Config(format!("rank of {key} is not an integer: {e}"))
        })?;
        Ok((row.id, rank))
    }

    /// Activity type codes of `keys`; keys that are not configured are skipped.
    pub async fn activity_types(&self, keys: &[ActivityKey]) -> AppResult<Vec<i32>> {
        let mut types = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(row) = self.get_by_key(key.as_str()).await? {
                types.push(row.id);
            }
        }
        Ok(types)
    }

    /// Display payload stored under a `reason.*` key.
    pub async fn reason(&self, key: &str) -> AppResult<Option<ReasonInfo>> {
        let Some(row) = self.get_by_key(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&row.value)
            .map(Some)
            .map_err(|e| AppError::Config(format!("{key} is not a reason payload: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn test_type_and_rank_from_seed() {
        let store = Arc::new(MemoryStore::seeded());
        let service = ConfigService::new(store);

        assert_eq!(
            service.type_and_rank(ActivityKey::QuestionVotedUp).await.unwrap(),
            (7, 10)
        );
        assert_eq!(
            service.type_and_rank(ActivityKey::AnswerDeleted).await.unwrap(),
            (10, -5)
        );
    }

    #[tokio::test]
    async fn test_unknown_key_is_bad_request() {
        let store = Arc::new(MemoryStore::new());
        let service = ConfigService::new(store);

        let err = service
            .type_and_rank(ActivityKey::QuestionAsked)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "activity type unknown"));
    }

    #[tokio::test]
    async fn test_rows_are_kept_after_first_read() {
        let store = Arc::new(MemoryStore::seeded());
        let service = ConfigService::new(store.clone());

        service.get_by_key("question.asked").await.unwrap();
        store.clear_configs().await;

        assert!(service.get_by_key("question.asked").await.unwrap().is_some());
        assert!(service.get_by_key("question.closed").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reason_payload() {
        let service = ConfigService::new(Arc::new(MemoryStore::seeded()));
        let reason = service.reason("reason.spam").await.unwrap().unwrap();
        assert_eq!(reason.name, "spam");
    }
}
