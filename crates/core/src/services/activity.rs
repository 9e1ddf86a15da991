//! Activity ledger.
//!
//! Every reputation-affecting action is one row keyed by
//! `(user_id, object_id, activity_type, trigger_user_id)`. The key is unique
//! in storage, so recording is idempotent even when two requests race: only
//! the caller whose insert (or re-activation) succeeds applies the rank delta
//! to the user's reputation. Cancelling works the same way in reverse.

use std::sync::Arc;

use agora_common::{AppError, AppResult, IdGenerator};
use agora_db::{
    entities::activity,
    repositories::{ActivityLookup, ActivityStore, UserStore},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::config::{ActivityKey, ConfigService};

/// Largest leaderboard page.
pub const MAX_LEADERBOARD_LIMIT: u64 = 100;

/// One action to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// User whose reputation changes.
    pub user_id: String,
    /// Acting user when different from `user_id`.
    pub trigger_user_id: Option<String>,
    pub object_id: String,
    /// Root object, e.g. the question of an answer.
    pub original_object_id: String,
    pub key: ActivityKey,
}

impl ActivityRecord {
    /// Record of an action the user performed on their own behalf.
    #[must_use]
    pub fn own(
        user_id: impl Into<String>,
        object_id: impl Into<String>,
        original_object_id: impl Into<String>,
        key: ActivityKey,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            trigger_user_id: None,
            object_id: object_id.into(),
            original_object_id: original_object_id.into(),
            key,
        }
    }

    /// Set the acting user. Acting on oneself is stored as no trigger.
    #[must_use]
    pub fn triggered_by(mut self, trigger_user_id: impl Into<String>) -> Self {
        let trigger = trigger_user_id.into();
        self.trigger_user_id = (trigger != self.user_id && !trigger.is_empty()).then_some(trigger);
        self
    }
}

/// Leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub user_id: String,
    pub amount: i64,
}

/// Ledger of reputation-affecting actions.
#[derive(Clone)]
pub struct ActivityService {
    activities: Arc<dyn ActivityStore>,
    users: Arc<dyn UserStore>,
    config: ConfigService,
    id_gen: IdGenerator,
}

impl ActivityService {
    #[must_use]
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        users: Arc<dyn UserStore>,
        config: ConfigService,
    ) -> Self {
        Self {
            activities,
            users,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    async fn lookup(
        &self,
        user_id: &str,
        trigger_user_id: Option<&str>,
        object_id: &str,
        key: ActivityKey,
    ) -> AppResult<(ActivityLookup, i32)> {
        let (activity_type, rank) = self.config.type_and_rank(key).await?;
        let lookup = ActivityLookup {
            user_id: user_id.to_string(),
            object_id: object_id.to_string(),
            activity_type,
            trigger_user_id: trigger_user_id.unwrap_or_default().to_string(),
        };
        Ok((lookup, rank))
    }

    /// Record an action.
    ///
    /// Returns `true` when this call moved the key into the active state and
    /// applied its rank; `false` when it was already active.
    pub async fn record(&self, record: ActivityRecord) -> AppResult<bool> {
        let (lookup, rank) = self
            .lookup(
                &record.user_id,
                record.trigger_user_id.as_deref(),
                &record.object_id,
                record.key,
            )
            .await?;

        let applied_rank = match self.activities.find_activity(&lookup).await? {
            Some(row) if !row.cancelled => None,
            Some(row) => self
                .activities
                .set_activity_cancelled(&row.id, false)
                .await?
                .then_some(row.rank),
            None => {
                let now = Utc::now().into();
                let row = activity::Model {
                    id: self.id_gen.generate(),
                    user_id: lookup.user_id.clone(),
                    trigger_user_id: lookup.trigger_user_id.clone(),
                    object_id: lookup.object_id.clone(),
                    original_object_id: record.original_object_id.clone(),
                    activity_type: lookup.activity_type,
                    rank,
                    has_rank: rank != 0,
                    cancelled: false,
                    cancelled_at: None,
                    created_at: now,
                    updated_at: now,
                };
                self.activities
                    .insert_activity(row)
                    .await?
                    .then_some(rank)
            }
        };

        let Some(rank) = applied_rank else {
            debug!(
                user_id = %record.user_id,
                object_id = %record.object_id,
                key = %record.key,
                "Activity already recorded"
            );
            return Ok(false);
        };

        self.users.add_user_rank(&record.user_id, rank).await?;
        info!(
            user_id = %record.user_id,
            object_id = %record.object_id,
            key = %record.key,
            rank,
            "Activity recorded"
        );
        Ok(true)
    }

    /// Record an action the user performed on their own behalf.
    pub async fn record_activity(
        &self,
        user_id: &str,
        object_id: &str,
        original_object_id: &str,
        key: ActivityKey,
    ) -> AppResult<bool> {
        self.record(ActivityRecord::own(user_id, object_id, original_object_id, key))
            .await
    }

    /// Cancel an action and take back its rank.
    ///
    /// Returns `true` when this call cancelled an active row; cancelling
    /// something that is not active is a no-op.
    pub async fn cancel(
        &self,
        user_id: &str,
        trigger_user_id: Option<&str>,
        object_id: &str,
        key: ActivityKey,
    ) -> AppResult<bool> {
        let (lookup, _) = self.lookup(user_id, trigger_user_id, object_id, key).await?;

        let Some(row) = self.activities.find_activity(&lookup).await? else {
            return Ok(false);
        };
        if row.cancelled || !self.activities.set_activity_cancelled(&row.id, true).await? {
            return Ok(false);
        }

        self.users.add_user_rank(user_id, -row.rank).await?;
        info!(
            user_id = %user_id,
            object_id = %object_id,
            key = %key,
            rank = -row.rank,
            "Activity cancelled"
        );
        Ok(true)
    }

    /// Cancel an action the user performed on their own behalf.
    pub async fn cancel_activity(
        &self,
        user_id: &str,
        object_id: &str,
        key: ActivityKey,
    ) -> AppResult<bool> {
        self.cancel(user_id, None, object_id, key).await
    }

    /// Net rank the user holds on an object.
    pub async fn sum_rank(&self, user_id: &str, object_id: &str) -> AppResult<i64> {
        self.activities.sum_rank(user_id, object_id).await
    }

    /// Users with the highest reputation gain in `[start, end]`.
    pub async fn top_gainers(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<RankEntry>> {
        check_window(start, end)?;
        if limit == 0 {
            return Ok(vec![]);
        }
        let rows = self
            .activities
            .top_gainers(start, end, limit.min(MAX_LEADERBOARD_LIMIT))
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| RankEntry {
                user_id: r.user_id,
                amount: r.amount,
            })
            .collect())
    }

    /// Users who voted most in `[start, end]`.
    pub async fn top_voters(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<RankEntry>> {
        check_window(start, end)?;
        if limit == 0 {
            return Ok(vec![]);
        }
        let types = self.config.activity_types(&ActivityKey::VOTES).await?;
        let rows = self
            .activities
            .top_voters(start, end, &types, limit.min(MAX_LEADERBOARD_LIMIT))
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| RankEntry {
                user_id: r.user_id,
                amount: r.amount,
            })
            .collect())
    }

    /// Active vote rows across the site.
    pub async fn vote_count(&self) -> AppResult<u64> {
        let types = self.config.activity_types(&ActivityKey::VOTES).await?;
        self.activities.count_activities(&types).await
    }
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if start > end {
        return Err(AppError::BadRequest(
            "start must not be after end".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, seeded_store, user_fixture};
    use agora_db::entities::user::UserRole;
    use agora_db::repositories::ActivityStore;
    use chrono::Duration;

    async fn service_with_users(store: &Arc<MemoryStore>, ids: &[&str]) -> ActivityService {
        for id in ids {
            store.put_user(user_fixture(id, UserRole::User, 0)).await;
        }
        ActivityService::new(
            store.clone(),
            store.clone(),
            ConfigService::new(store.clone()),
        )
    }

    fn voted_up(author: &str, voter: &str) -> ActivityRecord {
        ActivityRecord::own(author, "101q1", "101q1", ActivityKey::QuestionVotedUp)
            .triggered_by(voter)
    }

    #[tokio::test]
    async fn test_recording_twice_applies_rank_once() {
        let store = seeded_store();
        let service = service_with_users(&store, &["author", "voter"]).await;

        assert!(service.record(voted_up("author", "voter")).await.unwrap());
        assert!(!service.record(voted_up("author", "voter")).await.unwrap());

        let active: Vec<_> = store
            .activities()
            .await
            .into_iter()
            .filter(|a| !a.cancelled)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(store.user("author").await.unwrap().rank, 10);
    }

    #[tokio::test]
    async fn test_concurrent_records_apply_rank_once() {
        let store = seeded_store();
        let service = service_with_users(&store, &["author", "voter"]).await;

        let results = futures::future::join_all(
            (0..8).map(|_| service.record(voted_up("author", "voter"))),
        )
        .await;

        let applied = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
        assert_eq!(applied, 1);
        assert_eq!(store.user("author").await.unwrap().rank, 10);
    }

    #[tokio::test]
    async fn test_cancel_then_record_again() {
        let store = seeded_store();
        let service = service_with_users(&store, &["author", "voter"]).await;

        service.record(voted_up("author", "voter")).await.unwrap();
        assert!(service
            .cancel("author", Some("voter"), "101q1", ActivityKey::QuestionVotedUp)
            .await
            .unwrap());
        assert_eq!(store.user("author").await.unwrap().rank, 0);
        assert_eq!(service.sum_rank("author", "101q1").await.unwrap(), 0);

        assert!(service.record(voted_up("author", "voter")).await.unwrap());
        assert_eq!(store.user("author").await.unwrap().rank, 10);
        assert_eq!(store.activities().await.len(), 1);
        assert_eq!(service.sum_rank("author", "101q1").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_cancel_without_row_is_noop() {
        let store = seeded_store();
        let service = service_with_users(&store, &["u1"]).await;

        assert!(!service
            .cancel_activity("u1", "101q1", ActivityKey::QuestionVoteUp)
            .await
            .unwrap());
        assert_eq!(store.user("u1").await.unwrap().rank, 0);
    }

    #[tokio::test]
    async fn test_self_trigger_is_stored_without_trigger() {
        let record = ActivityRecord::own("u1", "101q1", "101q1", ActivityKey::QuestionClosed)
            .triggered_by("u1");
        assert_eq!(record.trigger_user_id, None);
    }

    #[tokio::test]
    async fn test_top_gainers_excludes_cancelled_and_orders() {
        let store = seeded_store();
        let service = service_with_users(&store, &["a", "b", "c", "d", "e", "v1", "v2", "v3"]).await;

        // a: 30, b: 20, c: 10 (+10 cancelled), d: 10, e: -2
        for voter in ["v1", "v2", "v3"] {
            service.record(voted_up("a", voter)).await.unwrap();
        }
        for voter in ["v1", "v2"] {
            service.record(voted_up("b", voter)).await.unwrap();
        }
        service.record(voted_up("c", "v1")).await.unwrap();
        service.record(voted_up("c", "v2")).await.unwrap();
        service
            .cancel("c", Some("v2"), "101q1", ActivityKey::QuestionVotedUp)
            .await
            .unwrap();
        service.record(voted_up("d", "v1")).await.unwrap();
        service
            .record(
                ActivityRecord::own("e", "101q1", "101q1", ActivityKey::QuestionVotedDown)
                    .triggered_by("v1"),
            )
            .await
            .unwrap();

        let now = Utc::now();
        let top = service
            .top_gainers(now - Duration::days(1), now + Duration::minutes(1), 3)
            .await
            .unwrap();

        let rows: Vec<_> = top.iter().map(|r| (r.user_id.as_str(), r.amount)).collect();
        assert_eq!(rows, [("a", 30), ("b", 20), ("c", 10)]);
    }

    #[tokio::test]
    async fn test_reactivated_row_counts_in_current_window() {
        let store = seeded_store();
        let service = service_with_users(&store, &["a", "v1"]).await;
        service.record(voted_up("a", "v1")).await.unwrap();
        service
            .cancel("a", Some("v1"), "101q1", ActivityKey::QuestionVotedUp)
            .await
            .unwrap();
        let mut row = store.activities().await.remove(0);
        let month_ago = (Utc::now() - Duration::days(30)).into();
        row.created_at = month_ago;
        row.updated_at = month_ago;

        let old = seeded_store();
        let service = service_with_users(&old, &["a", "v1"]).await;
        old.insert_activity(row).await.unwrap();

        assert!(service.record(voted_up("a", "v1")).await.unwrap());

        let now = Utc::now();
        let top = service
            .top_gainers(now - Duration::days(1), now + Duration::minutes(1), 3)
            .await
            .unwrap();
        let rows: Vec<_> = top.iter().map(|r| (r.user_id.as_str(), r.amount)).collect();
        assert_eq!(rows, [("a", 10)]);
    }

    #[tokio::test]
    async fn test_top_voters_counts_only_vote_keys() {
        let store = seeded_store();
        let service = service_with_users(&store, &["v1", "v2"]).await;

        for q in ["101q1", "101q2"] {
            service
                .record_activity("v1", q, q, ActivityKey::QuestionVoteUp)
                .await
                .unwrap();
        }
        service
            .record_activity("v2", "102a1", "101q1", ActivityKey::AnswerVoteDown)
            .await
            .unwrap();
        service
            .record_activity("v2", "101q3", "101q3", ActivityKey::QuestionAsked)
            .await
            .unwrap();

        let now = Utc::now();
        let top = service
            .top_voters(now - Duration::days(1), now + Duration::minutes(1), 10)
            .await
            .unwrap();
        let rows: Vec<_> = top.iter().map(|r| (r.user_id.as_str(), r.amount)).collect();
        assert_eq!(rows, [("v1", 2), ("v2", 1)]);
        assert_eq!(service.vote_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_inverted_window_is_rejected() {
        let store = seeded_store();
        let service = service_with_users(&store, &[]).await;
        let now = Utc::now();
        let err = service
            .top_gainers(now, now - Duration::days(1), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
