//! Comment service.

use std::sync::Arc;

use agora_common::{AppError, AppResult, IdGenerator, ObjectKind};
use agora_db::{
    entities::{comment, question::ContentStatus},
    repositories::{AnswerStore, CommentStore, QuestionStore},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::activity::{ActivityRecord, ActivityService};
use super::answer::{EXCERPT_CHARS, excerpt};
use super::config::ActivityKey;
use super::jobs::JobSender;
use super::notification::NotificationEvent;
use super::permission::{ActionInput, ObjectAction, PrivilegeResolver, ensure_action};
use crate::context::RequestContext;

/// New comment input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewComment {
    /// Question or answer being commented on.
    #[validate(length(min = 1))]
    pub object_id: String,
    #[validate(length(min = 2, max = 600))]
    pub content: String,
}

/// Thread a commented object belongs to.
struct CommentTarget {
    question_id: String,
    author_id: String,
}

/// Comment workflows.
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    questions: Arc<dyn QuestionStore>,
    answers: Arc<dyn AnswerStore>,
    activity: ActivityService,
    jobs: JobSender,
    privileges: PrivilegeResolver,
    id_gen: IdGenerator,
}

impl CommentService {
    #[must_use]
    pub fn new(
        comments: Arc<dyn CommentStore>,
        questions: Arc<dyn QuestionStore>,
        answers: Arc<dyn AnswerStore>,
        activity: ActivityService,
        jobs: JobSender,
        privileges: PrivilegeResolver,
    ) -> Self {
        Self {
            comments,
            questions,
            answers,
            activity,
            jobs,
            privileges,
            id_gen: IdGenerator::new(),
        }
    }

    async fn target(&self, object_id: &str) -> AppResult<CommentTarget> {
        let not_found = || AppError::NotFound("object not found".to_string());
        match ObjectKind::from_object_id(object_id) {
            Some(ObjectKind::Question) => {
                let question = self
                    .questions
                    .find_question(object_id)
                    .await?
                    .filter(|q| q.status != ContentStatus::Deleted)
                    .ok_or_else(not_found)?;
                Ok(CommentTarget {
                    question_id: question.id,
                    author_id: question.user_id,
                })
            }
            Some(ObjectKind::Answer) => {
                let answer = self
                    .answers
                    .find_answer(object_id)
                    .await?
                    .filter(|a| a.status != ContentStatus::Deleted)
                    .ok_or_else(not_found)?;
                Ok(CommentTarget {
                    question_id: answer.question_id,
                    author_id: answer.user_id,
                })
            }
            _ => Err(AppError::BadRequest(
                "comments attach to questions and answers".to_string(),
            )),
        }
    }

    /// Load a comment, treating deleted rows as missing.
    pub async fn find_live(&self, id: &str) -> AppResult<comment::Model> {
        self.comments
            .find_comment(id)
            .await?
            .filter(|c| c.status != ContentStatus::Deleted)
            .ok_or_else(|| AppError::NotFound("comment not found".to_string()))
    }

    /// Comment on a question or an answer.
    pub async fn create(&self, ctx: &RequestContext, input: NewComment) -> AppResult<comment::Model> {
        let author = ctx.require_user()?.to_string();
        let target = self.target(&input.object_id).await?;

        let now = Utc::now().into();
        let comment = self
            .comments
            .insert_comment(comment::Model {
                id: self.id_gen.generate_for(ObjectKind::Comment),
                object_id: input.object_id,
                question_id: target.question_id,
                user_id: author.clone(),
                original_text: input.content,
                status: ContentStatus::Available,
                vote_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await?;

        self.jobs
            .record_activity(ActivityRecord::own(
                &author,
                &comment.id,
                &comment.question_id,
                ActivityKey::CommentCreated,
            ))
            .await?;
        self.jobs
            .notify(NotificationEvent::NewComment {
                question_id: comment.question_id.clone(),
                object_id: comment.object_id.clone(),
                object_author_id: target.author_id,
                comment_id: comment.id.clone(),
                comment_author_id: author,
                excerpt: excerpt(&comment.original_text, EXCERPT_CHARS),
            })
            .await?;

        info!(comment_id = %comment.id, object_id = %comment.object_id, "Comment created");
        Ok(comment)
    }

    /// Delete on behalf of the caller.
    pub async fn remove_as(&self, ctx: &RequestContext, id: &str) -> AppResult<()> {
        ctx.require_user()?;
        let comment = self.find_live(id).await?;
        let capabilities = self.privileges.capabilities(ctx).await?;
        ensure_action(
            &ActionInput {
                kind: ObjectKind::Comment,
                viewer_id: ctx.user_id.as_deref(),
                owner_id: &comment.user_id,
                capabilities,
                question: None,
            },
            ObjectAction::Delete,
        )?;
        self.remove(id).await.map(|_| ())
    }

    /// Soft-delete a comment.
    ///
    /// Returns the comment when this call deleted it, `None` when it was
    /// already deleted.
    pub async fn remove(&self, id: &str) -> AppResult<Option<comment::Model>> {
        let Some(mut comment) = self.comments.find_comment(id).await? else {
            return Err(AppError::NotFound("comment not found".to_string()));
        };
        if comment.status == ContentStatus::Deleted {
            return Ok(None);
        }
        comment.status = ContentStatus::Deleted;
        comment.updated_at = Utc::now().into();
        let comment = self.comments.update_comment(comment).await?;

        self.activity
            .record_activity(
                &comment.user_id,
                &comment.id,
                &comment.question_id,
                ActivityKey::CommentDeleted,
            )
            .await?;
        info!(comment_id = %id, "Comment removed");
        Ok(Some(comment))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::i18n::Translator;
    use crate::services::config::ConfigService;
    use crate::services::jobs::{Job, JobService};
    use crate::services::site_info::SiteInfoService;
    use crate::testing::{
        MemoryStore, answer_fixture, comment_fixture, question_fixture, seeded_store, user_fixture,
    };
    use crate::validation::Validator;
    use agora_common::MemoryCache;
    use agora_db::entities::user::UserRole;

    fn setup() -> (Arc<MemoryStore>, JobService, CommentService) {
        let store = seeded_store();
        let site_info = SiteInfoService::new(
            store.clone(),
            Arc::new(MemoryCache::new()),
            Duration::from_secs(60),
            Validator::new(Arc::new(Translator::new())),
        );
        let activity = ActivityService::new(
            store.clone(),
            store.clone(),
            ConfigService::new(store.clone()),
        );
        let jobs = JobService::new(16);
        let service = CommentService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            activity,
            jobs.sender(),
            PrivilegeResolver::new(site_info),
        );
        (store, jobs, service)
    }

    #[tokio::test]
    async fn test_comment_on_answer_targets_answer_author() {
        let (store, mut jobs, service) = setup();
        store.put_question(question_fixture("101q1", "asker")).await;
        store.put_answer(answer_fixture("102a1", "101q1", "answerer")).await;
        let commenter = user_fixture("commenter", UserRole::User, 1);

        let comment = service
            .create(
                &RequestContext::for_user(&commenter, "r"),
                NewComment {
                    object_id: "102a1".to_string(),
                    content: "Could you add a link?".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(comment.question_id, "101q1");
        let queued = jobs.take_queued();
        assert_eq!(queued.len(), 2);
        assert!(matches!(
            &queued[1],
            Job::Notify(NotificationEvent::NewComment { object_author_id, .. })
                if object_author_id == "answerer"
        ));
    }

    #[tokio::test]
    async fn test_comment_on_tag_is_rejected() {
        let (_store, _jobs, service) = setup();
        let user = user_fixture("u", UserRole::User, 1);
        let err = service
            .create(
                &RequestContext::for_user(&user, "r"),
                NewComment {
                    object_id: "104t1".to_string(),
                    content: "hello there".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_remove_reports_first_deletion_only() {
        let (store, _jobs, service) = setup();
        store
            .put_comment(comment_fixture("103c1", "101q1", "101q1", "commenter"))
            .await;

        assert!(service.remove("103c1").await.unwrap().is_some());
        assert!(service.remove("103c1").await.unwrap().is_none());
        assert_eq!(store.activities().await.len(), 1);
        assert_eq!(
            store.comment("103c1").await.unwrap().status,
            ContentStatus::Deleted
        );
    }

    #[tokio::test]
    async fn test_moderator_removes_any_comment() {
        let (store, _jobs, service) = setup();
        store
            .put_comment(comment_fixture("103c1", "101q1", "101q1", "commenter"))
            .await;
        let moderator = user_fixture("mod", UserRole::Moderator, 1);

        service
            .remove_as(&RequestContext::for_user(&moderator, "r"), "103c1")
            .await
            .unwrap();
        assert!(service.find_live("103c1").await.is_err());
    }
}
