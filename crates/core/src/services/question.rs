//! Question service.
//!
//! `*_as` operations check the caller's actions first; the plain variants
//! are used by moderation and are idempotent.

use std::sync::Arc;

use agora_common::{AppError, AppResult, IdGenerator, ObjectKind};
use agora_db::{
    entities::{
        question::{self, ContentStatus, PinState, ShowState},
        tag, tag_rel,
    },
    repositories::{QuestionStore, TagStore},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::activity::{ActivityRecord, ActivityService};
use super::config::ActivityKey;
use super::jobs::JobSender;
use super::notification::NotificationEvent;
use super::permission::{
    ActionInput, Capabilities, ObjectAction, PermissionAction, PrivilegeResolver, QuestionState,
    can_view_deleted, describe_actions, ensure_action, object_actions,
};
use super::site_info::SiteInfoService;
use super::site_sections::SiteWrite;
use crate::context::RequestContext;
use crate::i18n::Translator;
use crate::validation::validate_slugs;

/// New question input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewQuestion {
    #[validate(length(min = 6, max = 150))]
    pub title: String,
    #[validate(length(min = 6, max = 65535))]
    pub content: String,
    /// Tag slugs; unknown slugs create tags.
    #[validate(length(max = 5), custom(function = "validate_slugs"))]
    #[serde(default)]
    pub tags: Vec<String>,
    /// Users asked to answer.
    #[validate(length(max = 5))]
    #[serde(default)]
    pub invite_users: Vec<String>,
}

/// Moderator operations that toggle visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOperation {
    Pin,
    Unpin,
    Hide,
    Show,
}

impl QuestionOperation {
    const fn action(self) -> ObjectAction {
        match self {
            Self::Pin => ObjectAction::Pin,
            Self::Unpin => ObjectAction::Unpin,
            Self::Hide => ObjectAction::Hide,
            Self::Show => ObjectAction::Show,
        }
    }
}

/// A question with what the viewer may do with it.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: question::Model,
    pub tag_ids: Vec<String>,
    pub actions: Vec<PermissionAction>,
}

/// Question workflows.
#[derive(Clone)]
pub struct QuestionService {
    questions: Arc<dyn QuestionStore>,
    tags: Arc<dyn TagStore>,
    activity: ActivityService,
    jobs: JobSender,
    privileges: PrivilegeResolver,
    site_info: SiteInfoService,
    translator: Arc<Translator>,
    id_gen: IdGenerator,
}

impl QuestionService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionStore>,
        tags: Arc<dyn TagStore>,
        activity: ActivityService,
        jobs: JobSender,
        privileges: PrivilegeResolver,
        site_info: SiteInfoService,
        translator: Arc<Translator>,
    ) -> Self {
        Self {
            questions,
            tags,
            activity,
            jobs,
            privileges,
            site_info,
            translator,
            id_gen: IdGenerator::new(),
        }
    }

    /// Load a question, treating deleted rows as missing.
    pub async fn find_live(&self, id: &str) -> AppResult<question::Model> {
        self.questions
            .find_question(id)
            .await?
            .filter(|q| q.status != ContentStatus::Deleted)
            .ok_or_else(|| AppError::NotFound("question not found".to_string()))
    }

    /// Whether the question exists and has been deleted.
    pub async fn is_deleted(&self, id: &str) -> AppResult<bool> {
        Ok(self
            .questions
            .find_question(id)
            .await?
            .is_some_and(|q| q.status == ContentStatus::Deleted))
    }

    /// Ask a question.
    pub async fn create(&self, ctx: &RequestContext, input: NewQuestion) -> AppResult<question::Model> {
        let author = ctx.require_user()?.to_string();
        let slugs = normalize_slugs(&input.tags);

        let write: SiteWrite = self.site_info.get_section().await?;
        if write.required_tag && slugs.is_empty() {
            return Err(AppError::BadRequest("at least one tag is required".to_string()));
        }

        let mut tags = self.tags.find_tags_by_slugs(&slugs).await?;
        if !ctx.is_staff() {
            let reserved = slugs.iter().find(|slug| {
                write.reserved_tags.contains(slug)
                    || tags.iter().any(|t| &t.slug_name == *slug && t.reserved)
            });
            if let Some(slug) = reserved {
                return Err(AppError::BadRequest(format!(
                    "tag {slug} is reserved for moderators"
                )));
            }
        }
        for slug in &slugs {
            if !tags.iter().any(|t| &t.slug_name == slug) {
                tags.push(self.create_tag(slug).await?);
            }
        }

        let now = Utc::now().into();
        let question = self
            .questions
            .insert_question(question::Model {
                id: self.id_gen.generate_for(ObjectKind::Question),
                user_id: author.clone(),
                title: input.title,
                original_text: input.content,
                status: ContentStatus::Available,
                pin: PinState::Unpinned,
                show: ShowState::Shown,
                view_count: 0,
                vote_count: 0,
                answer_count: 0,
                collection_count: 0,
                follow_count: 0,
                accepted_answer_id: None,
                close_msg: None,
                created_at: now,
                updated_at: now,
            })
            .await?;

        let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
        self.tags
            .link_question_tags(
                tag_ids
                    .iter()
                    .map(|tag_id| tag_rel::Model {
                        id: self.id_gen.generate(),
                        object_id: question.id.clone(),
                        tag_id: tag_id.clone(),
                        created_at: now,
                    })
                    .collect(),
            )
            .await?;

        self.jobs
            .record_activity(ActivityRecord::own(
                &author,
                &question.id,
                &question.id,
                ActivityKey::QuestionAsked,
            ))
            .await?;
        self.jobs
            .notify(NotificationEvent::NewQuestion {
                question_id: question.id.clone(),
                title: question.title.clone(),
                author_id: author.clone(),
                tag_ids,
            })
            .await?;
        if !input.invite_users.is_empty() {
            self.jobs
                .notify(NotificationEvent::InviteAnswer {
                    question_id: question.id.clone(),
                    question_title: question.title.clone(),
                    inviter_id: author.clone(),
                    invitee_ids: input.invite_users,
                })
                .await?;
        }

        info!(question_id = %question.id, user_id = %author, "Question created");
        Ok(question)
    }

    async fn create_tag(&self, slug: &str) -> AppResult<tag::Model> {
        self.tags
            .insert_tag(tag::Model {
                id: self.id_gen.generate_for(ObjectKind::Tag),
                slug_name: slug.to_string(),
                display_name: slug.to_string(),
                reserved: false,
                recommend: false,
                follow_count: 0,
                question_count: 0,
                created_at: Utc::now().into(),
            })
            .await
    }

    fn action_input<'a>(
        ctx: &'a RequestContext,
        question: &'a question::Model,
        capabilities: Capabilities,
    ) -> ActionInput<'a> {
        ActionInput {
            kind: ObjectKind::Question,
            viewer_id: ctx.user_id.as_deref(),
            owner_id: &question.user_id,
            capabilities,
            question: Some(QuestionState {
                status: question.status,
                pin: question.pin,
                show: question.show,
            }),
        }
    }

    /// A question with the viewer's actions.
    pub async fn get(&self, ctx: &RequestContext, id: &str) -> AppResult<QuestionDetail> {
        let question = self
            .questions
            .find_question(id)
            .await?
            .ok_or_else(|| AppError::NotFound("question not found".to_string()))?;
        let capabilities = self.privileges.capabilities(ctx).await?;
        if question.status == ContentStatus::Deleted
            && !can_view_deleted(ctx.is(&question.user_id), &capabilities)
        {
            return Err(AppError::NotFound("question not found".to_string()));
        }

        let actions = object_actions(&Self::action_input(
            ctx,
            &question,
            capabilities,
        ));
        let tag_ids = self.tags.find_question_tag_ids(&question.id).await?;
        Ok(QuestionDetail {
            actions: describe_actions(&actions, &self.translator, &ctx.language),
            tag_ids,
            question,
        })
    }

    async fn authorize(
        &self,
        ctx: &RequestContext,
        id: &str,
        action: ObjectAction,
    ) -> AppResult<question::Model> {
        ctx.require_user()?;
        let question = self.find_live(id).await?;
        let capabilities = self.privileges.capabilities(ctx).await?;
        ensure_action(&Self::action_input(ctx, &question, capabilities), action)?;
        Ok(question)
    }

    /// Close on behalf of the caller.
    pub async fn close_as(&self, ctx: &RequestContext, id: &str, message: Option<String>) -> AppResult<()> {
        self.authorize(ctx, id, ObjectAction::Close).await?;
        self.close(id, message).await
    }

    /// Reopen on behalf of the caller.
    pub async fn reopen_as(&self, ctx: &RequestContext, id: &str) -> AppResult<()> {
        self.authorize(ctx, id, ObjectAction::Reopen).await?;
        self.reopen(id).await
    }

    /// Pin, unpin, hide or show on behalf of the caller.
    pub async fn operate_as(&self, ctx: &RequestContext, id: &str, operation: QuestionOperation) -> AppResult<()> {
        self.authorize(ctx, id, operation.action()).await?;
        self.operate(id, operation).await
    }

    /// Delete on behalf of the caller.
    pub async fn remove_as(&self, ctx: &RequestContext, id: &str) -> AppResult<()> {
        self.authorize(ctx, id, ObjectAction::Delete).await?;
        self.remove(id).await
    }

    /// Close a question. Closing a closed question is a no-op.
    pub async fn close(&self, id: &str, message: Option<String>) -> AppResult<()> {
        let mut question = self.find_live(id).await?;
        if question.status == ContentStatus::Closed {
            return Ok(());
        }
        question.status = ContentStatus::Closed;
        question.close_msg = message;
        question.updated_at = Utc::now().into();
        let question = self.questions.update_question(question).await?;
        self.toggle_activity(&question, ActivityKey::QuestionClosed, ActivityKey::QuestionReopened)
            .await?;
        info!(question_id = %id, "Question closed");
        Ok(())
    }

    /// Reopen a closed question.
    pub async fn reopen(&self, id: &str) -> AppResult<()> {
        let mut question = self.find_live(id).await?;
        if question.status != ContentStatus::Closed {
            return Ok(());
        }
        question.status = ContentStatus::Available;
        question.close_msg = None;
        question.updated_at = Utc::now().into();
        let question = self.questions.update_question(question).await?;
        self.toggle_activity(&question, ActivityKey::QuestionReopened, ActivityKey::QuestionClosed)
            .await?;
        info!(question_id = %id, "Question reopened");
        Ok(())
    }

    /// Apply a visibility operation.
    pub async fn operate(&self, id: &str, operation: QuestionOperation) -> AppResult<()> {
        let mut question = self.find_live(id).await?;
        let (changed, done, undone) = match operation {
            QuestionOperation::Pin => (
                std::mem::replace(&mut question.pin, PinState::Pinned) != PinState::Pinned,
                ActivityKey::QuestionPinned,
                ActivityKey::QuestionUnpinned,
            ),
            QuestionOperation::Unpin => (
                std::mem::replace(&mut question.pin, PinState::Unpinned) != PinState::Unpinned,
                ActivityKey::QuestionUnpinned,
                ActivityKey::QuestionPinned,
            ),
            QuestionOperation::Hide => {
                // Hidden questions are never pinned.
                question.pin = PinState::Unpinned;
                (
                    std::mem::replace(&mut question.show, ShowState::Hidden) != ShowState::Hidden,
                    ActivityKey::QuestionHidden,
                    ActivityKey::QuestionShown,
                )
            }
            QuestionOperation::Show => (
                std::mem::replace(&mut question.show, ShowState::Shown) != ShowState::Shown,
                ActivityKey::QuestionShown,
                ActivityKey::QuestionHidden,
            ),
        };
        if !changed {
            return Ok(());
        }
        question.updated_at = Utc::now().into();
        let question = self.questions.update_question(question).await?;
        self.toggle_activity(&question, done, undone).await?;
        info!(question_id = %id, ?operation, "Question operation applied");
        Ok(())
    }

    /// Soft-delete a question. Deleting a deleted question is a no-op.
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let Some(mut question) = self.questions.find_question(id).await? else {
            return Err(AppError::NotFound("question not found".to_string()));
        };
        if question.status == ContentStatus::Deleted {
            return Ok(());
        }
        question.status = ContentStatus::Deleted;
        question.updated_at = Utc::now().into();
        let question = self.questions.update_question(question).await?;
        self.activity
            .record_activity(
                &question.user_id,
                &question.id,
                &question.id,
                ActivityKey::QuestionDeleted,
            )
            .await?;
        info!(question_id = %id, "Question removed");
        Ok(())
    }

    /// Record `done` for the author and withdraw its opposite.
    async fn toggle_activity(
        &self,
        question: &question::Model,
        done: ActivityKey,
        undone: ActivityKey,
    ) -> AppResult<()> {
        self.activity
            .cancel_activity(&question.user_id, &question.id, undone)
            .await?;
        self.activity
            .record_activity(&question.user_id, &question.id, &question.id, done)
            .await?;
        Ok(())
    }
}

fn normalize_slugs(tags: &[String]) -> Vec<String> {
    let mut slugs: Vec<String> = Vec::with_capacity(tags.len());
    for slug in tags.iter().map(|t| t.trim().to_lowercase()) {
        if !slug.is_empty() && !slugs.contains(&slug) {
            slugs.push(slug);
        }
    }
    slugs
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    use crate::services::config::ConfigService;
    use crate::services::jobs::{Job, JobService};
    use crate::testing::{MemoryStore, question_fixture, seeded_store, user_fixture};
    use crate::validation::Validator;
    use agora_common::MemoryCache;
    use agora_db::entities::user::UserRole;

    pub(crate) struct Fixture {
        pub store: Arc<MemoryStore>,
        pub jobs: JobService,
        pub site_info: SiteInfoService,
        pub service: QuestionService,
    }

    pub(crate) fn fixture() -> Fixture {
        let store = seeded_store();
        let translator = Arc::new(Translator::new());
        let site_info = SiteInfoService::new(
            store.clone(),
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
            Validator::new(translator.clone()),
        );
        let activity = ActivityService::new(
            store.clone(),
            store.clone(),
            ConfigService::new(store.clone()),
        );
        let jobs = JobService::new(64);
        let service = QuestionService::new(
            store.clone(),
            store.clone(),
            activity,
            jobs.sender(),
            PrivilegeResolver::new(site_info.clone()),
            site_info.clone(),
            translator,
        );
        Fixture {
            store,
            jobs,
            site_info,
            service,
        }
    }

    pub(crate) async fn ctx(store: &MemoryStore, id: &str, role: UserRole, rank: i32) -> RequestContext {
        let user = user_fixture(id, role, rank);
        store.put_user(user.clone()).await;
        RequestContext::for_user(&user, "req")
    }

    fn input(tags: &[&str]) -> NewQuestion {
        NewQuestion {
            title: "How do lifetimes work?".to_string(),
            content: "I keep fighting the borrow checker.".to_string(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            invite_users: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_links_and_creates_tags() {
        let mut f = fixture();
        let author = ctx(&f.store, "author", UserRole::User, 1).await;

        let question = f
            .service
            .create(&author, input(&["Rust", "rust", "async"]))
            .await
            .unwrap();

        let tags = f.store.tags().await;
        assert_eq!(tags.len(), 2);
        let linked = f.store.find_question_tag_ids(&question.id).await.unwrap();
        assert_eq!(linked.len(), 2);

        let jobs = f.jobs.take_queued();
        assert!(matches!(&jobs[0], Job::RecordActivity(r) if r.key == ActivityKey::QuestionAsked));
        assert!(matches!(&jobs[1], Job::Notify(NotificationEvent::NewQuestion { tag_ids, .. }) if tag_ids.len() == 2));
        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn test_reserved_tag_needs_staff() {
        let f = fixture();
        f.site_info
            .save_section(
                SiteWrite {
                    required_tag: true,
                    recommend_tags: vec![],
                    reserved_tags: vec!["meta".to_string()],
                },
                "en_US",
            )
            .await
            .unwrap();
        let user = ctx(&f.store, "user", UserRole::User, 1).await;
        let moderator = ctx(&f.store, "mod", UserRole::Moderator, 1).await;

        let err = f.service.create(&user, input(&["meta"])).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = f.service.create(&user, input(&[])).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(f.service.create(&moderator, input(&["meta"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_question_visible_to_owner_only() {
        let f = fixture();
        let owner = ctx(&f.store, "owner", UserRole::User, 1).await;
        let other = ctx(&f.store, "other", UserRole::User, 1).await;
        let mut question = question_fixture("101q1", "owner");
        question.status = ContentStatus::Deleted;
        f.store.put_question(question).await;

        let detail = f.service.get(&owner, "101q1").await.unwrap();
        let names: Vec<_> = detail.actions.iter().map(|a| a.action).collect();
        assert_eq!(names, [ObjectAction::Report, ObjectAction::Edit, ObjectAction::Delete]);
        assert!(matches!(
            f.service.get(&other, "101q1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_close_requires_privilege_and_is_idempotent() {
        let f = fixture();
        f.store.put_question(question_fixture("101q1", "owner")).await;
        let novice = ctx(&f.store, "novice", UserRole::User, 1).await;
        let veteran = ctx(&f.store, "veteran", UserRole::User, 1000).await;

        assert!(matches!(
            f.service.close_as(&novice, "101q1", None).await,
            Err(AppError::Forbidden(_))
        ));
        f.service
            .close_as(&veteran, "101q1", Some("duplicate".to_string()))
            .await
            .unwrap();
        f.service.close("101q1", None).await.unwrap();

        let question = f.store.question("101q1").await.unwrap();
        assert_eq!(question.status, ContentStatus::Closed);
        assert_eq!(question.close_msg.as_deref(), Some("duplicate"));
        // Closing again offers nothing to close.
        assert!(matches!(
            f.service.close_as(&veteran, "101q1", None).await,
            Err(AppError::Forbidden(_))
        ));

        f.service.reopen_as(&veteran, "101q1").await.unwrap();
        assert_eq!(
            f.store.question("101q1").await.unwrap().status,
            ContentStatus::Available
        );
    }

    #[tokio::test]
    async fn test_pin_and_hide_are_staff_only() {
        let f = fixture();
        f.store.put_question(question_fixture("101q1", "owner")).await;
        let owner = ctx(&f.store, "owner", UserRole::User, 100_000).await;
        let admin = ctx(&f.store, "admin", UserRole::Admin, 0).await;

        assert!(matches!(
            f.service.operate_as(&owner, "101q1", QuestionOperation::Pin).await,
            Err(AppError::Forbidden(_))
        ));
        f.service
            .operate_as(&admin, "101q1", QuestionOperation::Pin)
            .await
            .unwrap();
        f.service
            .operate_as(&admin, "101q1", QuestionOperation::Unpin)
            .await
            .unwrap();
        f.service
            .operate_as(&admin, "101q1", QuestionOperation::Hide)
            .await
            .unwrap();

        let question = f.store.question("101q1").await.unwrap();
        assert_eq!(question.show, ShowState::Hidden);
        assert_eq!(question.pin, PinState::Unpinned);
        // Hidden questions cannot be pinned.
        assert!(f
            .service
            .operate_as(&admin, "101q1", QuestionOperation::Pin)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let f = fixture();
        f.store.put_question(question_fixture("101q1", "owner")).await;
        let owner = ctx(&f.store, "owner", UserRole::User, 1).await;

        f.service.remove_as(&owner, "101q1").await.unwrap();
        f.service.remove("101q1").await.unwrap();

        assert_eq!(
            f.store.question("101q1").await.unwrap().status,
            ContentStatus::Deleted
        );
        let deleted = f
            .store
            .activities()
            .await
            .into_iter()
            .filter(|a| !a.cancelled)
            .count();
        assert_eq!(deleted, 1);
    }
}
