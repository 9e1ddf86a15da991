//! Answer service.

use std::sync::Arc;

use agora_common::{AppError, AppResult, IdGenerator, ObjectKind};
use agora_db::{
    entities::{
        answer,
        question::{self, ContentStatus},
    },
    repositories::{AnswerStore, QuestionStore},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::activity::{ActivityRecord, ActivityService};
use super::config::ActivityKey;
use super::jobs::JobSender;
use super::notification::NotificationEvent;
use super::permission::{ActionInput, ObjectAction, PrivilegeResolver, ensure_action};
use crate::context::RequestContext;

/// Characters of content quoted in notification mails.
pub(crate) const EXCERPT_CHARS: usize = 200;

/// First `max` characters of `text`, on a char boundary.
pub(crate) fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

/// New answer input.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAnswer {
    #[validate(length(min = 1))]
    pub question_id: String,
    #[validate(length(min = 6, max = 65535))]
    pub content: String,
}

/// Answer workflows.
#[derive(Clone)]
pub struct AnswerService {
    answers: Arc<dyn AnswerStore>,
    questions: Arc<dyn QuestionStore>,
    activity: ActivityService,
    jobs: JobSender,
    privileges: PrivilegeResolver,
    id_gen: IdGenerator,
}

impl AnswerService {
    #[must_use]
    pub fn new(
        answers: Arc<dyn AnswerStore>,
        questions: Arc<dyn QuestionStore>,
        activity: ActivityService,
        jobs: JobSender,
        privileges: PrivilegeResolver,
    ) -> Self {
        Self {
            answers,
            questions,
            activity,
            jobs,
            privileges,
            id_gen: IdGenerator::new(),
        }
    }

    async fn live_question(&self, id: &str) -> AppResult<question::Model> {
        self.questions
            .find_question(id)
            .await?
            .filter(|q| q.status != ContentStatus::Deleted)
            .ok_or_else(|| AppError::NotFound("question not found".to_string()))
    }

    /// Load an answer, treating deleted rows as missing.
    pub async fn find_live(&self, id: &str) -> AppResult<answer::Model> {
        self.answers
            .find_answer(id)
            .await?
            .filter(|a| a.status != ContentStatus::Deleted)
            .ok_or_else(|| AppError::NotFound("answer not found".to_string()))
    }

    /// Answer a question.
    pub async fn create(&self, ctx: &RequestContext, input: NewAnswer) -> AppResult<answer::Model> {
        let author = ctx.require_user()?.to_string();
        let question = self.live_question(&input.question_id).await?;
        if question.status == ContentStatus::Closed {
            return Err(AppError::BadRequest("question is closed".to_string()));
        }

        let now = Utc::now().into();
        let answer = self
            .answers
            .insert_answer(answer::Model {
                id: self.id_gen.generate_for(ObjectKind::Answer),
                question_id: question.id.clone(),
                user_id: author.clone(),
                original_text: input.content,
                status: ContentStatus::Available,
                vote_count: 0,
                accepted: false,
                created_at: now,
                updated_at: now,
            })
            .await?;

        self.questions.add_answer_count(&question.id, 1).await?;

        self.jobs
            .record_activity(ActivityRecord::own(
                &author,
                &answer.id,
                &question.id,
                ActivityKey::AnswerAnswered,
            ))
            .await?;
        self.jobs
            .notify(NotificationEvent::NewAnswer {
                question_id: question.id.clone(),
                question_title: question.title.clone(),
                question_author_id: question.user_id.clone(),
                answer_id: answer.id.clone(),
                answer_author_id: author.clone(),
                excerpt: excerpt(&answer.original_text, EXCERPT_CHARS),
            })
            .await?;

        info!(answer_id = %answer.id, question_id = %question.id, "Answer created");
        Ok(answer)
    }

    /// Delete on behalf of the caller.
    pub async fn remove_as(&self, ctx: &RequestContext, id: &str) -> AppResult<()> {
        ctx.require_user()?;
        let answer = self.find_live(id).await?;
        let capabilities = self.privileges.capabilities(ctx).await?;
        ensure_action(
            &ActionInput {
                kind: ObjectKind::Answer,
                viewer_id: ctx.user_id.as_deref(),
                owner_id: &answer.user_id,
                capabilities,
                question: None,
            },
            ObjectAction::Delete,
        )?;
        self.remove(id).await
    }

    /// Soft-delete an answer. Deleting a deleted answer is a no-op.
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let Some(mut answer) = self.answers.find_answer(id).await? else {
            return Err(AppError::NotFound("answer not found".to_string()));
        };
        if answer.status == ContentStatus::Deleted {
            return Ok(());
        }
        answer.status = ContentStatus::Deleted;
        answer.updated_at = Utc::now().into();
        let answer = self.answers.update_answer(answer).await?;

        self.questions.add_answer_count(&answer.question_id, -1).await?;
        self.activity
            .record_activity(
                &answer.user_id,
                &answer.id,
                &answer.question_id,
                ActivityKey::AnswerDeleted,
            )
            .await?;
        info!(answer_id = %id, "Answer removed");
        Ok(())
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
    use crate::testing::{MemoryStore, answer_fixture, question_fixture, seeded_store, user_fixture};
    use crate::validation::Validator;
    use agora_common::MemoryCache;
    use agora_db::entities::user::UserRole;

    fn setup() -> (Arc<MemoryStore>, JobService, AnswerService) {
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
        let service = AnswerService::new(
            store.clone(),
            store.clone(),
            activity,
            jobs.sender(),
            PrivilegeResolver::new(site_info),
        );
        (store, jobs, service)
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé…");
        assert_eq!(excerpt("short", 10), "short");
    }

    #[tokio::test]
    async fn test_create_counts_and_notifies() {
        let (store, mut jobs, service) = setup();
        store.put_question(question_fixture("101q1", "asker")).await;
        let answerer = user_fixture("answerer", UserRole::User, 1);
        store.put_user(answerer.clone()).await;

        let answer = service
            .create(
                &RequestContext::for_user(&answerer, "r"),
                NewAnswer {
                    question_id: "101q1".to_string(),
                    content: "Use a scoped thread.".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(store.question("101q1").await.unwrap().answer_count, 1);
        let queued = jobs.take_queued();
        assert!(matches!(
            &queued[1],
            Job::Notify(NotificationEvent::NewAnswer { answer_id, question_author_id, .. })
                if *answer_id == answer.id && question_author_id == "asker"
        ));
    }

    #[tokio::test]
    async fn test_closed_question_rejects_answers() {
        let (store, _jobs, service) = setup();
        let mut question = question_fixture("101q1", "asker");
        question.status = ContentStatus::Closed;
        store.put_question(question).await;
        let user = user_fixture("u", UserRole::User, 1);

        let err = service
            .create(
                &RequestContext::for_user(&user, "r"),
                NewAnswer {
                    question_id: "101q1".to_string(),
                    content: "Too late for this.".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_remove_costs_rank_once() {
        let (store, _jobs, service) = setup();
        let mut question = question_fixture("101q1", "asker");
        question.answer_count = 1;
        store.put_question(question).await;
        store.put_user(user_fixture("answerer", UserRole::User, 10)).await;
        store.put_answer(answer_fixture("102a1", "101q1", "answerer")).await;

        service.remove("102a1").await.unwrap();
        service.remove("102a1").await.unwrap();

        assert_eq!(store.user("answerer").await.unwrap().rank, 5);
        assert_eq!(store.question("101q1").await.unwrap().answer_count, 0);
    }

    #[tokio::test]
    async fn test_stranger_cannot_remove() {
        let (store, _jobs, service) = setup();
        store.put_question(question_fixture("101q1", "asker")).await;
        store.put_answer(answer_fixture("102a1", "101q1", "answerer")).await;
        let stranger = user_fixture("stranger", UserRole::User, 1);

        let err = service
            .remove_as(&RequestContext::for_user(&stranger, "r"), "102a1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
