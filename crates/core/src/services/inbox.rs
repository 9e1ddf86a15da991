//! In-app inbox notifications.

use std::sync::Arc;

use agora_common::{AppResult, IdGenerator, ObjectKind};
use agora_db::{
    entities::notification::{self, InboxAction},
    repositories::InboxStore,
};
use chrono::Utc;
use tracing::debug;

use super::notification::NotificationEvent;

/// Largest inbox page.
pub const MAX_INBOX_PAGE: u64 = 100;

/// Writes and reads inbox rows.
#[derive(Clone)]
pub struct InboxService {
    store: Arc<dyn InboxStore>,
    id_gen: IdGenerator,
}

impl InboxService {
    #[must_use]
    pub fn new(store: Arc<dyn InboxStore>) -> Self {
        Self {
            store,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add one inbox row. Notifying oneself is skipped.
    pub async fn notify(
        &self,
        user_id: &str,
        trigger_user_id: Option<&str>,
        object_id: &str,
        action: InboxAction,
    ) -> AppResult<()> {
        if trigger_user_id == Some(user_id) {
            return Ok(());
        }
        let object_type = ObjectKind::from_object_id(object_id)
            .map_or("unknown", ObjectKind::as_str)
            .to_string();
        self.store
            .insert_notification(notification::Model {
                id: self.id_gen.generate(),
                user_id: user_id.to_string(),
                trigger_user_id: trigger_user_id.map(str::to_string),
                object_id: object_id.to_string(),
                object_type,
                action,
                is_read: false,
                created_at: Utc::now().into(),
            })
            .await?;
        debug!(user_id = %user_id, object_id = %object_id, ?action, "Inbox notification added");
        Ok(())
    }

    /// Inbox rows for the parts of an event that have one.
    pub async fn handle(&self, event: &NotificationEvent) -> AppResult<()> {
        match event {
            NotificationEvent::NewQuestion { .. } => Ok(()),
            NotificationEvent::NewAnswer {
                question_author_id,
                answer_id,
                answer_author_id,
                ..
            } => {
                self.notify(
                    question_author_id,
                    Some(answer_author_id),
                    answer_id,
                    InboxAction::AnswerTheQuestion,
                )
                .await
            }
            NotificationEvent::NewComment {
                object_id,
                object_author_id,
                comment_id,
                comment_author_id,
                ..
            } => {
                let action = if ObjectKind::from_object_id(object_id) == Some(ObjectKind::Answer) {
                    InboxAction::CommentAnswer
                } else {
                    InboxAction::CommentQuestion
                };
                self.notify(object_author_id, Some(comment_author_id), comment_id, action)
                    .await
            }
            NotificationEvent::InviteAnswer {
                question_id,
                inviter_id,
                invitee_ids,
                ..
            } => {
                for invitee in invitee_ids {
                    self.notify(
                        invitee,
                        Some(inviter_id),
                        question_id,
                        InboxAction::InvitedYouToAnswer,
                    )
                    .await?;
                }
                Ok(())
            }
        }
    }

    /// Latest inbox rows of a user.
    pub async fn list(&self, user_id: &str, limit: u64) -> AppResult<Vec<notification::Model>> {
        self.store
            .find_user_notifications(user_id, limit.clamp(1, MAX_INBOX_PAGE))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::seeded_store;

    #[tokio::test]
    async fn test_comment_on_answer_uses_answer_action() {
        let store = seeded_store();
        let inbox = InboxService::new(store.clone());

        inbox
            .handle(&NotificationEvent::NewComment {
                question_id: "101q1".to_string(),
                object_id: "102a1".to_string(),
                object_author_id: "owner".to_string(),
                comment_id: "103c1".to_string(),
                comment_author_id: "commenter".to_string(),
                excerpt: "hi".to_string(),
            })
            .await
            .unwrap();

        let rows = inbox.list("owner", 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, InboxAction::CommentAnswer);
        assert_eq!(rows[0].object_type, "comment");
        assert_eq!(rows[0].trigger_user_id.as_deref(), Some("commenter"));
    }

    #[tokio::test]
    async fn test_self_notification_skipped() {
        let store = seeded_store();
        let inbox = InboxService::new(store.clone());
        inbox
            .notify("u1", Some("u1"), "101q1", InboxAction::AnswerTheQuestion)
            .await
            .unwrap();
        assert!(store.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_invite_adds_one_row_per_invitee() {
        let store = seeded_store();
        let inbox = InboxService::new(store.clone());
        inbox
            .handle(&NotificationEvent::InviteAnswer {
                question_id: "101q1".to_string(),
                question_title: "Why?".to_string(),
                inviter_id: "boss".to_string(),
                invitee_ids: vec!["a".to_string(), "b".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(store.notifications().await.len(), 2);
    }
}
