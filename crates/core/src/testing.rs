//! In-memory implementations of every store trait.
//!
//! [`MemoryStore`] mirrors the constraints of the SQL schema that services
//! rely on: the unique activity key, conditional cancel updates, the unique
//! `(user_id, source)` subscription and the unique follow pair.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use agora_common::{AppError, AppResult};
use agora_db::entities::{
    activity, answer, comment, config, follow, notification, question,
    report::{self, ReportStatus},
    site_info::{self, SiteInfoType},
    tag, tag_rel, user,
    user_notification_config::{self, NotificationSource},
};
use agora_db::migrations::{ACTIVITY_TYPES, REASONS};
use agora_db::repositories::{
    ActivityLookup, ActivityStore, AnswerStore, CommentStore, ConfigStore, FollowStore,
    InboxStore, NotificationConfigStore, QuestionStore, ReportFilter, ReportStore, SiteInfoStore,
    TagStore, UserAmount, UserStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::services::{MailDelivery, OutgoingMail};

#[derive(Default)]
struct State {
    configs: Vec<config::Model>,
    activities: Vec<activity::Model>,
    users: BTreeMap<String, user::Model>,
    questions: BTreeMap<String, question::Model>,
    answers: BTreeMap<String, answer::Model>,
    comments: BTreeMap<String, comment::Model>,
    tags: BTreeMap<String, tag::Model>,
    tag_rels: Vec<tag_rel::Model>,
    follows: Vec<follow::Model>,
    reports: BTreeMap<String, report::Model>,
    site_info: HashMap<SiteInfoType, site_info::Model>,
    notification_configs: Vec<user_notification_config::Model>,
    notifications: Vec<notification::Model>,
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_counts: AtomicBool,
    fail_writes: AtomicUsize,
}

fn db_down() -> AppError {
    AppError::Database("connection refused".to_string())
}

impl MemoryStore {
    /// Empty store without reference data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the same reference rows the migrations seed.
    #[must_use]
    pub fn seeded() -> Self {
        let mut configs: Vec<config::Model> = ACTIVITY_TYPES
            .iter()
            .map(|(id, key, rank)| config::Model {
                id: *id,
                key: (*key).to_string(),
                value: rank.to_string(),
            })
            .collect();
        configs.extend(REASONS.iter().map(|(id, key, name, description)| {
            config::Model {
                id: *id,
                key: (*key).to_string(),
                value: serde_json::json!({ "name": name, "description": description })
                    .to_string(),
            }
        }));

        Self {
            state: Mutex::new(State {
                configs,
                ..State::default()
            }),
            fail_counts: AtomicBool::new(false),
            fail_writes: AtomicUsize::new(0),
        }
    }

    /// Make every `count_*` call fail.
    pub fn fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }

    fn counts_fail(&self) -> bool {
        self.fail_counts.load(Ordering::SeqCst)
    }

    /// Make the next `n` activity or inbox inserts fail.
    pub fn fail_writes(&self, n: usize) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    fn write_fails(&self) -> bool {
        self.fail_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    pub async fn clear_configs(&self) {
        self.state.lock().await.configs.clear();
    }

    pub async fn put_user(&self, user: user::Model) {
        self.state.lock().await.users.insert(user.id.clone(), user);
    }

    pub async fn user(&self, id: &str) -> Option<user::Model> {
        self.state.lock().await.users.get(id).cloned()
    }

    pub async fn put_question(&self, question: question::Model) {
        self.state
            .lock()
            .await
            .questions
            .insert(question.id.clone(), question);
    }

    pub async fn question(&self, id: &str) -> Option<question::Model> {
        self.state.lock().await.questions.get(id).cloned()
    }

    pub async fn put_answer(&self, answer: answer::Model) {
        self.state
            .lock()
            .await
            .answers
            .insert(answer.id.clone(), answer);
    }

    pub async fn answer(&self, id: &str) -> Option<answer::Model> {
        self.state.lock().await.answers.get(id).cloned()
    }

    pub async fn put_comment(&self, comment: comment::Model) {
        self.state
            .lock()
            .await
            .comments
            .insert(comment.id.clone(), comment);
    }

    pub async fn comment(&self, id: &str) -> Option<comment::Model> {
        self.state.lock().await.comments.get(id).cloned()
    }

    pub async fn tags(&self) -> Vec<tag::Model> {
        self.state.lock().await.tags.values().cloned().collect()
    }

    pub async fn report(&self, id: &str) -> Option<report::Model> {
        self.state.lock().await.reports.get(id).cloned()
    }

    pub async fn put_report(&self, report: report::Model) {
        self.state
            .lock()
            .await
            .reports
            .insert(report.id.clone(), report);
    }

    pub async fn activities(&self) -> Vec<activity::Model> {
        self.state.lock().await.activities.clone()
    }

    pub async fn notifications(&self) -> Vec<notification::Model> {
        self.state.lock().await.notifications.clone()
    }

    /// Change a site-info row behind the back of any cache.
    pub async fn overwrite_site_info(&self, site_type: SiteInfoType, content: &str) {
        if let Some(row) = self.state.lock().await.site_info.get_mut(&site_type) {
            row.content = content.to_string();
        }
    }
}

fn key_matches(row: &activity::Model, lookup: &ActivityLookup) -> bool {
    row.user_id == lookup.user_id
        && row.object_id == lookup.object_id
        && row.activity_type == lookup.activity_type
        && row.trigger_user_id == lookup.trigger_user_id
}

fn in_window(row: &activity::Model, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    let at = row.updated_at.with_timezone(&Utc);
    at >= start && at <= end
}

fn ranked(amounts: HashMap<String, i64>, limit: u64) -> Vec<UserAmount> {
    let mut rows: Vec<UserAmount> = amounts
        .into_iter()
        .map(|(user_id, amount)| UserAmount { user_id, amount })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.user_id.cmp(&b.user_id)));
    rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    rows
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn find_activity(&self, lookup: &ActivityLookup) -> AppResult<Option<activity::Model>> {
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .find(|row| key_matches(row, lookup))
            .cloned())
    }

    async fn insert_activity(&self, model: activity::Model) -> AppResult<bool> {
        if self.write_fails() {
            return Err(db_down());
        }
        let mut state = self.state.lock().await;
        let lookup = ActivityLookup {
            user_id: model.user_id.clone(),
            object_id: model.object_id.clone(),
            activity_type: model.activity_type,
            trigger_user_id: model.trigger_user_id.clone(),
        };
        if state.activities.iter().any(|row| key_matches(row, &lookup)) {
            return Ok(false);
        }
        state.activities.push(model);
        Ok(true)
    }

    async fn set_activity_cancelled(&self, id: &str, cancelled: bool) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(row) = state
            .activities
            .iter_mut()
            .find(|row| row.id == id && row.cancelled != cancelled)
        else {
            return Ok(false);
        };
        let now = Utc::now().into();
        row.cancelled = cancelled;
        row.cancelled_at = cancelled.then_some(now);
        row.updated_at = now;
        Ok(true)
    }

    async fn sum_rank(&self, user_id: &str, object_id: &str) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .filter(|row| row.user_id == user_id && row.object_id == object_id && !row.cancelled)
            .map(|row| i64::from(row.rank))
            .sum())
    }

    async fn top_gainers(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<UserAmount>> {
        let state = self.state.lock().await;
        let mut amounts: HashMap<String, i64> = HashMap::new();
        for row in state
            .activities
            .iter()
            .filter(|row| row.has_rank && !row.cancelled && in_window(row, start, end))
        {
            *amounts.entry(row.user_id.clone()).or_default() += i64::from(row.rank);
        }
        Ok(ranked(amounts, limit))
    }

    async fn top_voters(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        activity_types: &[i32],
        limit: u64,
    ) -> AppResult<Vec<UserAmount>> {
        let state = self.state.lock().await;
        let mut amounts: HashMap<String, i64> = HashMap::new();
        for row in state.activities.iter().filter(|row| {
            activity_types.contains(&row.activity_type)
                && !row.cancelled
                && in_window(row, start, end)
        }) {
            *amounts.entry(row.user_id.clone()).or_default() += 1;
        }
        Ok(ranked(amounts, limit))
    }

    async fn count_activities(&self, activity_types: &[i32]) -> AppResult<u64> {
        if self.counts_fail() {
            return Err(db_down());
        }
        let state = self.state.lock().await;
        Ok(state
            .activities
            .iter()
            .filter(|row| activity_types.contains(&row.activity_type) && !row.cancelled)
            .count() as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: &str) -> AppResult<Option<user::Model>> {
        Ok(self.state.lock().await.users.get(id).cloned())
    }

    async fn find_user_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.access_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_users(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        let state = self.state.lock().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn add_user_rank(&self, id: &str, delta: i32) -> AppResult<()> {
        if let Some(user) = self.state.lock().await.users.get_mut(id) {
            user.rank += delta;
        }
        Ok(())
    }

    async fn count_users(&self) -> AppResult<u64> {
        if self.counts_fail() {
            return Err(db_down());
        }
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.status != user::UserStatus::Deleted)
            .count() as u64)
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn find_config_by_key(&self, key: &str) -> AppResult<Option<config::Model>> {
        let state = self.state.lock().await;
        Ok(state.configs.iter().find(|c| c.key == key).cloned())
    }

    async fn find_configs_by_prefix(&self, prefix: &str) -> AppResult<Vec<config::Model>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .configs
            .iter()
            .filter(|c| c.key.starts_with(prefix))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn find_question(&self, id: &str) -> AppResult<Option<question::Model>> {
        Ok(self.question(id).await)
    }

    async fn insert_question(&self, model: question::Model) -> AppResult<question::Model> {
        self.put_question(model.clone()).await;
        Ok(model)
    }

    async fn update_question(&self, model: question::Model) -> AppResult<question::Model> {
        let mut state = self.state.lock().await;
        let row = state
            .questions
            .get_mut(&model.id)
            .ok_or_else(|| AppError::Database("record not updated".to_string()))?;
        *row = question::Model {
            view_count: row.view_count,
            vote_count: row.vote_count,
            answer_count: row.answer_count,
            collection_count: row.collection_count,
            follow_count: row.follow_count,
            ..model
        };
        Ok(row.clone())
    }

    async fn add_question_vote_count(&self, id: &str, delta: i32) -> AppResult<Option<i32>> {
        let mut state = self.state.lock().await;
        Ok(state.questions.get_mut(id).map(|row| {
            row.vote_count += delta;
            row.vote_count
        }))
    }

    async fn add_answer_count(&self, id: &str, delta: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(row) = state.questions.get_mut(id)
            && row.answer_count + delta >= 0
        {
            row.answer_count += delta;
        }
        Ok(())
    }

    async fn count_questions(&self) -> AppResult<u64> {
        if self.counts_fail() {
            return Err(db_down());
        }
        let state = self.state.lock().await;
        Ok(state
            .questions
            .values()
            .filter(|q| q.status != question::ContentStatus::Deleted)
            .count() as u64)
    }
}

#[async_trait]
impl AnswerStore for MemoryStore {
    async fn find_answer(&self, id: &str) -> AppResult<Option<answer::Model>> {
        Ok(self.answer(id).await)
    }

    async fn insert_answer(&self, model: answer::Model) -> AppResult<answer::Model> {
        self.put_answer(model.clone()).await;
        Ok(model)
    }

    async fn update_answer(&self, model: answer::Model) -> AppResult<answer::Model> {
        let mut state = self.state.lock().await;
        let row = state
            .answers
            .get_mut(&model.id)
            .ok_or_else(|| AppError::Database("record not updated".to_string()))?;
        *row = answer::Model {
            vote_count: row.vote_count,
            ..model
        };
        Ok(row.clone())
    }

    async fn add_answer_vote_count(&self, id: &str, delta: i32) -> AppResult<Option<i32>> {
        let mut state = self.state.lock().await;
        Ok(state.answers.get_mut(id).map(|row| {
            row.vote_count += delta;
            row.vote_count
        }))
    }

    async fn count_answers(&self) -> AppResult<u64> {
        if self.counts_fail() {
            return Err(db_down());
        }
        let state = self.state.lock().await;
        Ok(state
            .answers
            .values()
            .filter(|a| a.status != answer::ContentStatus::Deleted)
            .count() as u64)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn find_comment(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Ok(self.comment(id).await)
    }

    async fn insert_comment(&self, model: comment::Model) -> AppResult<comment::Model> {
        self.put_comment(model.clone()).await;
        Ok(model)
    }

    async fn update_comment(&self, model: comment::Model) -> AppResult<comment::Model> {
        let mut state = self.state.lock().await;
        let row = state
            .comments
            .get_mut(&model.id)
            .ok_or_else(|| AppError::Database("record not updated".to_string()))?;
        *row = model.clone();
        Ok(model)
    }

    async fn count_comments(&self) -> AppResult<u64> {
        if self.counts_fail() {
            return Err(db_down());
        }
        let state = self.state.lock().await;
        Ok(state
            .comments
            .values()
            .filter(|c| c.status != comment::ContentStatus::Deleted)
            .count() as u64)
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn find_tags_by_slugs(&self, slugs: &[String]) -> AppResult<Vec<tag::Model>> {
        let state = self.state.lock().await;
        Ok(state
            .tags
            .values()
            .filter(|t| slugs.contains(&t.slug_name))
            .cloned()
            .collect())
    }

    async fn insert_tag(&self, model: tag::Model) -> AppResult<tag::Model> {
        let mut state = self.state.lock().await;
        if state.tags.values().any(|t| t.slug_name == model.slug_name) {
            return Err(AppError::Database("duplicate slug".to_string()));
        }
        state.tags.insert(model.id.clone(), model.clone());
        Ok(model)
    }

    async fn find_question_tag_ids(&self, question_id: &str) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .tag_rels
            .iter()
            .filter(|r| r.object_id == question_id)
            .map(|r| r.tag_id.clone())
            .collect())
    }

    async fn link_question_tags(&self, links: Vec<tag_rel::Model>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for link in links {
            let exists = state
                .tag_rels
                .iter()
                .any(|r| r.object_id == link.object_id && r.tag_id == link.tag_id);
            if !exists {
                state.tag_rels.push(link);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FollowStore for MemoryStore {
    async fn find_follower_ids(&self, object_ids: &[String]) -> AppResult<Vec<String>> {
        let state = self.state.lock().await;
        let mut ids: Vec<String> = state
            .follows
            .iter()
            .filter(|f| object_ids.contains(&f.object_id))
            .map(|f| f.user_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn insert_follow(&self, model: follow::Model) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let exists = state
            .follows
            .iter()
            .any(|f| f.user_id == model.user_id && f.object_id == model.object_id);
        if !exists {
            state.follows.push(model);
        }
        Ok(())
    }

    async fn delete_follow(&self, user_id: &str, object_id: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.user_id == user_id && f.object_id == object_id));
        Ok(state.follows.len() != before)
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert_report(&self, model: report::Model) -> AppResult<report::Model> {
        self.put_report(model.clone()).await;
        Ok(model)
    }

    async fn find_report(&self, id: &str) -> AppResult<Option<report::Model>> {
        Ok(self.report(id).await)
    }

    async fn update_report(&self, model: report::Model) -> AppResult<report::Model> {
        let mut state = self.state.lock().await;
        let row = state
            .reports
            .get_mut(&model.id)
            .ok_or_else(|| AppError::Database("record not updated".to_string()))?;
        *row = model.clone();
        Ok(model)
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<report::Model>, u64)> {
        let state = self.state.lock().await;
        let mut rows: Vec<report::Model> = state
            .reports
            .values()
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .filter(|r| {
                filter
                    .object_type
                    .as_deref()
                    .is_none_or(|t| r.object_type == t)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = rows.len() as u64;
        let page = rows
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    async fn count_reports(&self, status: ReportStatus) -> AppResult<u64> {
        if self.counts_fail() {
            return Err(db_down());
        }
        let state = self.state.lock().await;
        Ok(state.reports.values().filter(|r| r.status == status).count() as u64)
    }
}

#[async_trait]
impl SiteInfoStore for MemoryStore {
    async fn find_site_info(&self, site_type: SiteInfoType) -> AppResult<Option<site_info::Model>> {
        Ok(self.state.lock().await.site_info.get(&site_type).cloned())
    }

    async fn insert_site_info(&self, model: site_info::Model) -> AppResult<site_info::Model> {
        let mut state = self.state.lock().await;
        if state.site_info.contains_key(&model.site_type) {
            return Err(AppError::Database("duplicate site info type".to_string()));
        }
        state.site_info.insert(model.site_type, model.clone());
        Ok(model)
    }

    async fn update_site_info(&self, model: site_info::Model) -> AppResult<site_info::Model> {
        self.state
            .lock()
            .await
            .site_info
            .insert(model.site_type, model.clone());
        Ok(model)
    }
}

#[async_trait]
impl NotificationConfigStore for MemoryStore {
    async fn find_source_subscribers(
        &self,
        source: NotificationSource,
        user_ids: Option<&[String]>,
    ) -> AppResult<Vec<user_notification_config::Model>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .notification_configs
            .iter()
            .filter(|c| c.source == source && c.enabled)
            .filter(|c| user_ids.is_none_or(|ids| ids.contains(&c.user_id)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(rows)
    }

    async fn find_user_configs(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<user_notification_config::Model>> {
        let state = self.state.lock().await;
        Ok(state
            .notification_configs
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert_config(&self, model: user_notification_config::Model) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(row) = state
            .notification_configs
            .iter_mut()
            .find(|c| c.user_id == model.user_id && c.source == model.source)
        {
            row.channels = model.channels;
            row.enabled = model.enabled;
            row.updated_at = model.updated_at;
        } else {
            state.notification_configs.push(model);
        }
        Ok(())
    }
}

#[async_trait]
impl InboxStore for MemoryStore {
    async fn insert_notification(&self, model: notification::Model) -> AppResult<()> {
        if self.write_fails() {
            return Err(db_down());
        }
        self.state.lock().await.notifications.push(model);
        Ok(())
    }

    async fn find_user_notifications(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Mail delivery that keeps every message for inspection.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail_for: Mutex<Vec<String>>,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse mail to `address`.
    pub async fn fail_for(&self, address: &str) {
        self.fail_for.lock().await.push(address.to_string());
    }

    pub async fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().await.clone()
    }

    pub async fn recipients(&self) -> Vec<String> {
        let mut to: Vec<_> = self.sent.lock().await.iter().map(|m| m.to.clone()).collect();
        to.sort();
        to
    }
}

#[async_trait]
impl MailDelivery for RecordingMailer {
    async fn deliver(&self, mail: OutgoingMail) -> AppResult<()> {
        if self.fail_for.lock().await.contains(&mail.to) {
            return Err(AppError::ExternalService(format!(
                "mailbox {} unavailable",
                mail.to
            )));
        }
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

/// Build a user fixture.
#[must_use]
pub fn user_fixture(id: &str, role: user::UserRole, rank: i32) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        display_name: format!("User {id}"),
        email: format!("{id}@example.com"),
        language: "en_US".to_string(),
        role,
        rank,
        status: user::UserStatus::Available,
        mail_status: user::MailStatus::Available,
        access_token: Some(format!("token-{id}")),
        question_count: 0,
        answer_count: 0,
        created_at: Utc::now().into(),
    }
}

/// Build a question fixture owned by `user_id`.
#[must_use]
pub fn question_fixture(id: &str, user_id: &str) -> question::Model {
    let now = Utc::now().into();
    question::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: format!("Question {id}"),
        original_text: "How does this work?".to_string(),
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

/// Build an answer fixture.
#[must_use]
pub fn answer_fixture(id: &str, question_id: &str, user_id: &str) -> answer::Model {
    let now = Utc::now().into();
    answer::Model {
        id: id.to_string(),
        question_id: question_id.to_string(),
        user_id: user_id.to_string(),
        original_text: "Like this.".to_string(),
        status: answer::ContentStatus::Available,
        vote_count: 0,
        accepted: false,
        created_at: now,
        updated_at: now,
    }
}

/// Build a comment fixture on `object_id`.
#[must_use]
pub fn comment_fixture(id: &str, object_id: &str, question_id: &str, user_id: &str) -> comment::Model {
    let now = Utc::now().into();
    comment::Model {
        id: id.to_string(),
        object_id: object_id.to_string(),
        question_id: question_id.to_string(),
        user_id: user_id.to_string(),
        original_text: "Nice.".to_string(),
        status: comment::ContentStatus::Available,
        vote_count: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Build a subscription row.
#[must_use]
pub fn subscription_fixture(
    user_id: &str,
    source: NotificationSource,
    email: bool,
) -> user_notification_config::Model {
    user_notification_config::Model {
        id: format!("{user_id}-{source:?}"),
        user_id: user_id.to_string(),
        source,
        channels: serde_json::json!([{ "key": "email", "enable": email }]),
        enabled: true,
        updated_at: Utc::now().into(),
    }
}

/// Shared handle used by most tests.
#[must_use]
pub fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::seeded())
}
