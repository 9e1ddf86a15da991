//! Voting on questions and answers.

use std::sync::Arc;

use agora_common::{AppError, AppResult, ObjectKind};
use agora_db::{
    entities::question::ContentStatus,
    repositories::{AnswerStore, QuestionStore},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::activity::{ActivityRecord, ActivityService};
use super::config::ActivityKey;
use crate::context::RequestContext;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    const fn delta(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Vote state of the caller after a vote operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteResult {
    pub vote_count: i32,
    pub vote_status: Option<VoteDirection>,
}

/// Ledger keys of a vote: the voter's row and the author's row.
const fn vote_keys(kind: ObjectKind, direction: VoteDirection) -> Option<(ActivityKey, ActivityKey)> {
    match (kind, direction) {
        (ObjectKind::Question, VoteDirection::Up) => {
            Some((ActivityKey::QuestionVoteUp, ActivityKey::QuestionVotedUp))
        }
        (ObjectKind::Question, VoteDirection::Down) => {
            Some((ActivityKey::QuestionVoteDown, ActivityKey::QuestionVotedDown))
        }
        (ObjectKind::Answer, VoteDirection::Up) => {
            Some((ActivityKey::AnswerVoteUp, ActivityKey::AnswerVotedUp))
        }
        (ObjectKind::Answer, VoteDirection::Down) => {
            Some((ActivityKey::AnswerVoteDown, ActivityKey::AnswerVotedDown))
        }
        _ => None,
    }
}

struct VoteTarget {
    kind: ObjectKind,
    author_id: String,
    original_object_id: String,
}

/// Vote workflow on top of the activity ledger.
#[derive(Clone)]
pub struct VoteService {
    activity: ActivityService,
    questions: Arc<dyn QuestionStore>,
    answers: Arc<dyn AnswerStore>,
}

impl VoteService {
    #[must_use]
    pub fn new(
        activity: ActivityService,
        questions: Arc<dyn QuestionStore>,
        answers: Arc<dyn AnswerStore>,
    ) -> Self {
        Self {
            activity,
            questions,
            answers,
        }
    }

    async fn target(&self, object_id: &str) -> AppResult<VoteTarget> {
        match ObjectKind::from_object_id(object_id) {
            Some(ObjectKind::Question) => {
                let question = self
                    .questions
                    .find_question(object_id)
                    .await?
                    .filter(|q| q.status != ContentStatus::Deleted)
                    .ok_or_else(|| AppError::NotFound("question not found".to_string()))?;
                Ok(VoteTarget {
                    kind: ObjectKind::Question,
                    author_id: question.user_id,
                    original_object_id: question.id,
                })
            }
            Some(ObjectKind::Answer) => {
                let answer = self
                    .answers
                    .find_answer(object_id)
                    .await?
                    .filter(|a| a.status != ContentStatus::Deleted)
                    .ok_or_else(|| AppError::NotFound("answer not found".to_string()))?;
                Ok(VoteTarget {
                    kind: ObjectKind::Answer,
                    author_id: answer.user_id,
                    original_object_id: answer.question_id,
                })
            }
            _ => Err(AppError::BadRequest("object cannot be voted".to_string())),
        }
    }

    async fn adjust_vote_count(&self, kind: ObjectKind, object_id: &str, delta: i32) -> AppResult<i32> {
        match kind {
            ObjectKind::Question => self
                .questions
                .add_question_vote_count(object_id, delta)
                .await?
                .ok_or_else(|| AppError::NotFound("question not found".to_string())),
            _ => self
                .answers
                .add_answer_vote_count(object_id, delta)
                .await?
                .ok_or_else(|| AppError::NotFound("answer not found".to_string())),
        }
    }

    /// Cast a vote, replacing an opposite vote of the same voter.
    pub async fn vote(
        &self,
        ctx: &RequestContext,
        object_id: &str,
        direction: VoteDirection,
    ) -> AppResult<VoteResult> {
        let voter = ctx.require_user()?;
        let target = self.target(object_id).await?;
        if target.author_id == voter {
            return Err(AppError::BadRequest(
                "cannot vote for your own content".to_string(),
            ));
        }

        let mut delta = 0;
        delta += self
            .withdraw(voter, object_id, &target, direction.opposite())
            .await?;

        let (voter_key, author_key) = vote_keys(target.kind, direction)
            .ok_or_else(|| AppError::BadRequest("object cannot be voted".to_string()))?;
        let cast = self
            .activity
            .record_activity(voter, object_id, &target.original_object_id, voter_key)
            .await?;
        if cast {
            self.activity
                .record(
                    ActivityRecord::own(
                        &target.author_id,
                        object_id,
                        &target.original_object_id,
                        author_key,
                    )
                    .triggered_by(voter),
                )
                .await?;
            delta += direction.delta();
            info!(voter = %voter, object_id = %object_id, ?direction, "Vote cast");
        }

        let vote_count = self.adjust_vote_count(target.kind, object_id, delta).await?;
        Ok(VoteResult {
            vote_count,
            vote_status: Some(direction),
        })
    }

    /// Withdraw a vote.
    pub async fn undo_vote(
        &self,
        ctx: &RequestContext,
        object_id: &str,
        direction: VoteDirection,
    ) -> AppResult<VoteResult> {
        let voter = ctx.require_user()?;
        let target = self.target(object_id).await?;
        let delta = self.withdraw(voter, object_id, &target, direction).await?;
        let vote_count = self.adjust_vote_count(target.kind, object_id, delta).await?;
        Ok(VoteResult {
            vote_count,
            vote_status: None,
        })
    }

    /// Cancel both ledger rows of a vote; returns the vote count change.
    async fn withdraw(
        &self,
        voter: &str,
        object_id: &str,
        target: &VoteTarget,
        direction: VoteDirection,
    ) -> AppResult<i32> {
        let Some((voter_key, author_key)) = vote_keys(target.kind, direction) else {
            return Ok(0);
        };
        if !self
            .activity
            .cancel_activity(voter, object_id, voter_key)
            .await?
        {
            return Ok(0);
        }
        self.activity
            .cancel(&target.author_id, Some(voter), object_id, author_key)
            .await?;
        info!(voter = %voter, object_id = %object_id, ?direction, "Vote withdrawn");
        Ok(-direction.delta())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::config::ConfigService;
    use crate::testing::{MemoryStore, answer_fixture, question_fixture, seeded_store, user_fixture};
    use agora_db::entities::{
        question,
        user::{self, UserRole},
    };

    const Q: &str = "101q1";
    const A: &str = "102a1";

    async fn setup() -> (Arc<MemoryStore>, VoteService) {
        let store = seeded_store();
        for id in ["author", "voter"] {
            store.put_user(user_fixture(id, UserRole::User, 0)).await;
        }
        store.put_question(question_fixture(Q, "author")).await;
        store.put_answer(answer_fixture(A, Q, "author")).await;
        let activity = ActivityService::new(
            store.clone(),
            store.clone(),
            ConfigService::new(store.clone()),
        );
        (store.clone(), VoteService::new(activity, store.clone(), store))
    }

    fn ctx(user: &user::Model) -> RequestContext {
        RequestContext::for_user(user, "req")
    }

    /// Marks the question deleted right after handing it out, the way a
    /// removal committed between a read and a write would.
    struct DeletedAfterRead(Arc<MemoryStore>);

    #[async_trait::async_trait]
    impl QuestionStore for DeletedAfterRead {
        async fn find_question(&self, id: &str) -> AppResult<Option<question::Model>> {
            let found = self.0.find_question(id).await?;
            if let Some(mut row) = found.clone() {
                row.status = ContentStatus::Deleted;
                self.0.put_question(row).await;
            }
            Ok(found)
        }

        async fn insert_question(&self, model: question::Model) -> AppResult<question::Model> {
            self.0.insert_question(model).await
        }

        async fn update_question(&self, model: question::Model) -> AppResult<question::Model> {
            self.0.update_question(model).await
        }

        async fn add_question_vote_count(&self, id: &str, delta: i32) -> AppResult<Option<i32>> {
            self.0.add_question_vote_count(id, delta).await
        }

        async fn add_answer_count(&self, id: &str, delta: i32) -> AppResult<()> {
            self.0.add_answer_count(id, delta).await
        }

        async fn count_questions(&self) -> AppResult<u64> {
            self.0.count_questions().await
        }
    }

    #[tokio::test]
    async fn test_vote_keeps_concurrent_deletion() {
        let (store, _) = setup().await;
        let activity = ActivityService::new(
            store.clone(),
            store.clone(),
            ConfigService::new(store.clone()),
        );
        let service = VoteService::new(
            activity,
            Arc::new(DeletedAfterRead(store.clone())),
            store.clone(),
        );
        let voter = ctx(&store.user("voter").await.unwrap());

        let result = service.vote(&voter, Q, VoteDirection::Up).await.unwrap();

        let question = store.question(Q).await.unwrap();
        assert_eq!(question.status, ContentStatus::Deleted);
        assert_eq!(question.vote_count, 1);
        assert_eq!(result.vote_count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_votes_all_count() {
        let (store, service) = setup().await;
        let mut voters = Vec::new();
        for i in 0..8 {
            let user = user_fixture(&format!("voter{i}"), UserRole::User, 0);
            store.put_user(user.clone()).await;
            voters.push(ctx(&user));
        }

        let results = futures::future::join_all(
            voters
                .iter()
                .map(|voter| service.vote(voter, A, VoteDirection::Up)),
        )
        .await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(store.answer(A).await.unwrap().vote_count, 8);
    }

    #[tokio::test]
    async fn test_vote_up_credits_author_once() {
        let (store, service) = setup().await;
        let voter = ctx(&store.user("voter").await.unwrap());

        let first = service.vote(&voter, Q, VoteDirection::Up).await.unwrap();
        let second = service.vote(&voter, Q, VoteDirection::Up).await.unwrap();

        assert_eq!(first.vote_count, 1);
        assert_eq!(second.vote_count, 1);
        assert_eq!(store.user("author").await.unwrap().rank, 10);
        assert_eq!(store.question(Q).await.unwrap().vote_count, 1);
    }

    #[tokio::test]
    async fn test_flipping_vote_replaces_the_opposite() {
        let (store, service) = setup().await;
        let voter = ctx(&store.user("voter").await.unwrap());

        service.vote(&voter, A, VoteDirection::Up).await.unwrap();
        let result = service.vote(&voter, A, VoteDirection::Down).await.unwrap();

        assert_eq!(result.vote_count, -1);
        // answer.voted_down for the author, answer.vote_down costs the voter.
        assert_eq!(store.user("author").await.unwrap().rank, -2);
        assert_eq!(store.user("voter").await.unwrap().rank, -1);
    }

    #[tokio::test]
    async fn test_undo_vote_restores_rank() {
        let (store, service) = setup().await;
        let voter = ctx(&store.user("voter").await.unwrap());

        service.vote(&voter, Q, VoteDirection::Up).await.unwrap();
        let result = service.undo_vote(&voter, Q, VoteDirection::Up).await.unwrap();

        assert_eq!(result.vote_count, 0);
        assert_eq!(result.vote_status, None);
        assert_eq!(store.user("author").await.unwrap().rank, 0);
    }

    #[tokio::test]
    async fn test_self_vote_rejected() {
        let (store, service) = setup().await;
        let author = ctx(&store.user("author").await.unwrap());
        let err = service.vote(&author, Q, VoteDirection::Up).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_comment_cannot_be_voted() {
        let (store, service) = setup().await;
        let voter = ctx(&store.user("voter").await.unwrap());
        let err = service
            .vote(&voter, "103c1", VoteDirection::Up)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
