//! External notification fan-out.
//!
//! Content services emit a [`NotificationEvent`] on the job queue. The
//! worker resolves who wants to hear about it, renders one mail per
//! subscriber and channel and hands it to the configured [`MailDelivery`].
//! A failure for one recipient is logged and the batch carries on.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppResult, SharedCache};
use agora_db::{
    entities::{
        user::{self, MailStatus, UserStatus},
        user_notification_config::{NotificationChannel, NotificationSource},
    },
    repositories::{FollowStore, NotificationConfigStore, UserStore},
};
use tracing::{debug, info, warn};

use super::email::{EmailService, MailTemplate};
use super::mail::{MailDelivery, OutgoingMail};

/// Something subscribers may be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    NewQuestion {
        question_id: String,
        title: String,
        author_id: String,
        tag_ids: Vec<String>,
    },
    NewAnswer {
        question_id: String,
        question_title: String,
        question_author_id: String,
        answer_id: String,
        answer_author_id: String,
        excerpt: String,
    },
    NewComment {
        question_id: String,
        /// Question or answer the comment is on.
        object_id: String,
        object_author_id: String,
        comment_id: String,
        comment_author_id: String,
        excerpt: String,
    },
    InviteAnswer {
        question_id: String,
        question_title: String,
        inviter_id: String,
        invitee_ids: Vec<String>,
    },
}

impl NotificationEvent {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NewQuestion { .. } => "new_question",
            Self::NewAnswer { .. } => "new_answer",
            Self::NewComment { .. } => "new_comment",
            Self::InviteAnswer { .. } => "invite_answer",
        }
    }
}

/// Caps how many new-question mails one user receives per window.
///
/// The first hit starts the window; later hits only count, so the window is
/// never extended. A counter never exists without its expiry.
#[derive(Clone)]
pub struct NewQuestionLimiter {
    cache: SharedCache,
    max: i64,
    window: Duration,
}

impl NewQuestionLimiter {
    #[must_use]
    pub fn new(cache: SharedCache, max: i64, window: Duration) -> Self {
        Self { cache, max, window }
    }

    fn key(user_id: &str) -> String {
        format!("new_question_notification_limit:{user_id}")
    }

    /// Count one mail for `user_id`; `false` when the user is over the limit.
    ///
    /// Cache failures let the mail through.
    pub async fn try_acquire(&self, user_id: &str) -> bool {
        match self
            .cache
            .increase_in_window(&Self::key(user_id), self.window)
            .await
        {
            Ok(count) => count <= self.max,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "New question limiter unavailable");
                true
            }
        }
    }
}

/// One resolved recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Recipient {
    user_id: String,
    source: NotificationSource,
    channels: Vec<NotificationChannel>,
}

/// Result of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
}

/// Resolves subscribers and sends them mail.
#[derive(Clone)]
pub struct ExternalNotificationService {
    configs: Arc<dyn NotificationConfigStore>,
    follows: Arc<dyn FollowStore>,
    users: Arc<dyn UserStore>,
    email: EmailService,
    mailer: Arc<dyn MailDelivery>,
    limiter: NewQuestionLimiter,
}

impl ExternalNotificationService {
    #[must_use]
    pub fn new(
        configs: Arc<dyn NotificationConfigStore>,
        follows: Arc<dyn FollowStore>,
        users: Arc<dyn UserStore>,
        email: EmailService,
        mailer: Arc<dyn MailDelivery>,
        limiter: NewQuestionLimiter,
    ) -> Self {
        Self {
            configs,
            follows,
            users,
            email,
            mailer,
            limiter,
        }
    }

    /// Fan an event out to its subscribers.
    pub async fn handle(&self, event: &NotificationEvent) -> AppResult<DispatchSummary> {
        let (recipients, template) = match event {
            NotificationEvent::NewQuestion {
                question_id,
                title,
                author_id,
                tag_ids,
            } => (
                self.new_question_recipients(author_id, tag_ids).await?,
                MailTemplate::NewQuestion {
                    question_id: question_id.clone(),
                    title: title.clone(),
                },
            ),
            NotificationEvent::NewAnswer {
                question_id,
                question_title,
                question_author_id,
                answer_author_id,
                excerpt,
                ..
            } => (
                self.inbox_recipients(&[question_author_id.clone()], answer_author_id)
                    .await?,
                MailTemplate::NewAnswer {
                    question_id: question_id.clone(),
                    title: question_title.clone(),
                    excerpt: excerpt.clone(),
                },
            ),
            NotificationEvent::NewComment {
                question_id,
                object_author_id,
                comment_author_id,
                excerpt,
                ..
            } => (
                self.inbox_recipients(&[object_author_id.clone()], comment_author_id)
                    .await?,
                MailTemplate::NewComment {
                    question_id: question_id.clone(),
                    excerpt: excerpt.clone(),
                },
            ),
            NotificationEvent::InviteAnswer {
                question_id,
                question_title,
                inviter_id,
                invitee_ids,
            } => {
                let inviter = self
                    .users
                    .find_user(inviter_id)
                    .await?
                    .map_or_else(|| inviter_id.clone(), |u| u.display_name);
                (
                    self.inbox_recipients(invitee_ids, inviter_id).await?,
                    MailTemplate::InviteAnswer {
                        question_id: question_id.clone(),
                        title: question_title.clone(),
                        inviter,
                    },
                )
            }
        };

        let summary = self.dispatch(&recipients, &template).await?;
        info!(
            event = event.name(),
            recipients = recipients.len(),
            sent = summary.sent,
            failed = summary.failed,
            "Notification fan-out finished"
        );
        Ok(summary)
    }

    /// Followers of the question's tags who opted in, then site-wide
    /// subscribers still under the rate limit. Never the author.
    async fn new_question_recipients(
        &self,
        author_id: &str,
        tag_ids: &[String],
    ) -> AppResult<Vec<Recipient>> {
        let followers = self.follows.find_follower_ids(tag_ids).await?;
        let mut recipients: Vec<Recipient> = self
            .configs
            .find_source_subscribers(
                NotificationSource::AllNewQuestionForFollowingTags,
                Some(&followers),
            )
            .await?
            .into_iter()
            .filter(|c| c.user_id != author_id)
            .map(|c| Recipient {
                channels: c.enabled_channels(),
                user_id: c.user_id,
                source: NotificationSource::AllNewQuestionForFollowingTags,
            })
            .filter(|r| !r.channels.is_empty())
            .collect();

        let everything = self
            .configs
            .find_source_subscribers(NotificationSource::AllNewQuestion, None)
            .await?;
        for config in everything {
            let channels = config.enabled_channels();
            if channels.is_empty()
                || config.user_id == author_id
                || recipients.iter().any(|r| r.user_id == config.user_id)
            {
                continue;
            }
            if !self.limiter.try_acquire(&config.user_id).await {
                debug!(user_id = %config.user_id, "New question mail suppressed by limit");
                continue;
            }
            recipients.push(Recipient {
                channels,
                user_id: config.user_id,
                source: NotificationSource::AllNewQuestion,
            });
        }
        Ok(recipients)
    }

    /// Users with inbox mail enabled, minus the actor.
    async fn inbox_recipients(&self, user_ids: &[String], actor_id: &str) -> AppResult<Vec<Recipient>> {
        let targets: Vec<String> = user_ids
            .iter()
            .filter(|id| id.as_str() != actor_id)
            .cloned()
            .collect();
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .configs
            .find_source_subscribers(NotificationSource::Inbox, Some(&targets))
            .await?
            .into_iter()
            .map(|c| Recipient {
                channels: c.enabled_channels(),
                user_id: c.user_id,
                source: NotificationSource::Inbox,
            })
            .collect())
    }

    async fn dispatch(&self, recipients: &[Recipient], template: &MailTemplate) -> AppResult<DispatchSummary> {
        let ids: Vec<String> = recipients.iter().map(|r| r.user_id.clone()).collect();
        let users: HashMap<String, user::Model> = self
            .users
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let mut summary = DispatchSummary::default();
        for recipient in recipients {
            let Some(user) = users.get(&recipient.user_id) else {
                continue;
            };
            if user.status != UserStatus::Available || user.mail_status != MailStatus::Available {
                continue;
            }
            for channel in &recipient.channels {
                match channel {
                    NotificationChannel::Email => {
                        match self.send_email(user, recipient.source, template).await {
                            Ok(()) => summary.sent += 1,
                            Err(e) => {
                                summary.failed += 1;
                                warn!(
                                    user_id = %user.id,
                                    error = %e,
                                    "Failed to deliver notification mail"
                                );
                            }
                        }
                    }
                }
            }
        }
        Ok(summary)
    }

    async fn send_email(
        &self,
        user: &user::Model,
        source: NotificationSource,
        template: &MailTemplate,
    ) -> AppResult<()> {
        let rendered = self
            .email
            .render(template, &user.language, &user.id, source)
            .await?;
        self.mailer
            .deliver(OutgoingMail {
                to: user.email.clone(),
                subject: rendered.subject,
                body: rendered.body,
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::i18n::Translator;
    use crate::services::site_info::SiteInfoService;
    use crate::testing::{
        MemoryStore, RecordingMailer, seeded_store, subscription_fixture, user_fixture,
    };
    use crate::validation::Validator;
    use agora_common::MemoryCache;
    use agora_db::entities::{follow, user::UserRole};
    use chrono::Utc;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    struct Fixture {
        store: Arc<MemoryStore>,
        mailer: Arc<RecordingMailer>,
        service: ExternalNotificationService,
    }

    async fn fixture(users: &[&str]) -> Fixture {
        let store = seeded_store();
        for id in users {
            store.put_user(user_fixture(id, UserRole::User, 0)).await;
        }
        let cache: SharedCache = Arc::new(MemoryCache::new());
        let translator = Arc::new(Translator::new());
        let site_info = SiteInfoService::new(
            store.clone(),
            cache.clone(),
            Duration::from_secs(60),
            Validator::new(translator.clone()),
        );
        let email = EmailService::new(
            site_info,
            cache.clone(),
            translator,
            "https://qa.example.com",
            "Agora",
            Duration::from_secs(60),
        );
        let mailer = Arc::new(RecordingMailer::new());
        let service = ExternalNotificationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            email,
            mailer.clone(),
            NewQuestionLimiter::new(cache, 3, WEEK),
        );
        Fixture {
            store,
            mailer,
            service,
        }
    }

    async fn follow_tag(store: &MemoryStore, user_id: &str, tag_id: &str) {
        store
            .insert_follow(follow::Model {
                id: format!("{user_id}-{tag_id}"),
                user_id: user_id.to_string(),
                object_id: tag_id.to_string(),
                created_at: Utc::now().into(),
            })
            .await
            .unwrap();
    }

    async fn subscribe(store: &MemoryStore, user_id: &str, source: NotificationSource) {
        store
            .upsert_config(subscription_fixture(user_id, source, true))
            .await
            .unwrap();
    }

    fn new_question(author: &str) -> NotificationEvent {
        NotificationEvent::NewQuestion {
            question_id: "101q1".to_string(),
            title: "Why?".to_string(),
            author_id: author.to_string(),
            tag_ids: vec!["104t1".to_string(), "104t2".to_string()],
        }
    }

    #[tokio::test]
    async fn test_new_question_excludes_author_and_dedupes() {
        let f = fixture(&["author", "fan", "all"]).await;
        // The author follows a tag of their own question.
        for user in ["author", "fan"] {
            follow_tag(&f.store, user, "104t1").await;
            follow_tag(&f.store, user, "104t2").await;
            subscribe(&f.store, user, NotificationSource::AllNewQuestionForFollowingTags).await;
        }
        subscribe(&f.store, "fan", NotificationSource::AllNewQuestion).await;
        subscribe(&f.store, "all", NotificationSource::AllNewQuestion).await;

        let summary = f.service.handle(&new_question("author")).await.unwrap();

        assert_eq!(summary.sent, 2);
        assert_eq!(
            f.mailer.recipients().await,
            ["all@example.com", "fan@example.com"]
        );
    }

    #[tokio::test]
    async fn test_following_tags_requires_opt_in() {
        let f = fixture(&["author", "follower"]).await;
        follow_tag(&f.store, "follower", "104t1").await;

        let summary = f.service.handle(&new_question("author")).await.unwrap();
        assert_eq!(summary, DispatchSummary::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_suppresses_then_recovers() {
        let f = fixture(&["author", "reader"]).await;
        subscribe(&f.store, "reader", NotificationSource::AllNewQuestion).await;

        for _ in 0..3 {
            assert_eq!(f.service.handle(&new_question("author")).await.unwrap().sent, 1);
        }
        assert_eq!(f.service.handle(&new_question("author")).await.unwrap().sent, 0);

        tokio::time::advance(WEEK + Duration::from_secs(1)).await;
        assert_eq!(f.service.handle(&new_question("author")).await.unwrap().sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_window_restarts_every_time() {
        let f = fixture(&["author", "reader"]).await;
        subscribe(&f.store, "reader", NotificationSource::AllNewQuestion).await;

        for _ in 0..2 {
            for _ in 0..3 {
                assert_eq!(f.service.handle(&new_question("author")).await.unwrap().sent, 1);
            }
            assert_eq!(f.service.handle(&new_question("author")).await.unwrap().sent, 0);
            tokio::time::advance(WEEK + Duration::from_secs(1)).await;
        }
        assert_eq!(f.service.handle(&new_question("author")).await.unwrap().sent, 1);
    }

    #[tokio::test]
    async fn test_tag_subscription_without_channels_falls_through_to_all_questions() {
        let f = fixture(&["author", "reader"]).await;
        follow_tag(&f.store, "reader", "104t1").await;
        f.store
            .upsert_config(subscription_fixture(
                "reader",
                NotificationSource::AllNewQuestionForFollowingTags,
                false,
            ))
            .await
            .unwrap();
        subscribe(&f.store, "reader", NotificationSource::AllNewQuestion).await;

        let summary = f.service.handle(&new_question("author")).await.unwrap();

        assert_eq!(summary.sent, 1);
        assert_eq!(f.mailer.recipients().await, ["reader@example.com"]);
    }

    #[tokio::test]
    async fn test_all_questions_without_channels_is_skipped() {
        let f = fixture(&["author", "reader"]).await;
        f.store
            .upsert_config(subscription_fixture(
                "reader",
                NotificationSource::AllNewQuestion,
                false,
            ))
            .await
            .unwrap();

        let summary = f.service.handle(&new_question("author")).await.unwrap();
        assert_eq!(summary, DispatchSummary::default());
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_stop_batch() {
        let f = fixture(&["author", "a", "b"]).await;
        subscribe(&f.store, "a", NotificationSource::AllNewQuestion).await;
        subscribe(&f.store, "b", NotificationSource::AllNewQuestion).await;
        f.mailer.fail_for("a@example.com").await;

        let summary = f.service.handle(&new_question("author")).await.unwrap();

        assert_eq!(summary, DispatchSummary { sent: 1, failed: 1 });
        assert_eq!(f.mailer.recipients().await, ["b@example.com"]);
    }

    #[tokio::test]
    async fn test_new_answer_notifies_question_author_only() {
        let f = fixture(&["asker", "answerer"]).await;
        subscribe(&f.store, "asker", NotificationSource::Inbox).await;
        subscribe(&f.store, "answerer", NotificationSource::Inbox).await;

        let event = NotificationEvent::NewAnswer {
            question_id: "101q1".to_string(),
            question_title: "Why?".to_string(),
            question_author_id: "asker".to_string(),
            answer_id: "102a1".to_string(),
            answer_author_id: "answerer".to_string(),
            excerpt: "Because.".to_string(),
        };
        f.service.handle(&event).await.unwrap();

        let sent = f.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "asker@example.com");
        assert!(sent[0].body.contains("Because."));
    }

    #[tokio::test]
    async fn test_answering_own_question_sends_nothing() {
        let f = fixture(&["asker"]).await;
        subscribe(&f.store, "asker", NotificationSource::Inbox).await;

        let event = NotificationEvent::NewAnswer {
            question_id: "101q1".to_string(),
            question_title: "Why?".to_string(),
            question_author_id: "asker".to_string(),
            answer_id: "102a1".to_string(),
            answer_author_id: "asker".to_string(),
            excerpt: "Self answer.".to_string(),
        };
        assert_eq!(f.service.handle(&event).await.unwrap().sent, 0);
    }

    #[tokio::test]
    async fn test_invite_skips_inviter_and_unverified() {
        let f = fixture(&["inviter", "x", "y"]).await;
        let mut unverified = user_fixture("y", UserRole::User, 0);
        unverified.mail_status = MailStatus::ToBeVerified;
        f.store.put_user(unverified).await;
        for user in ["inviter", "x", "y"] {
            subscribe(&f.store, user, NotificationSource::Inbox).await;
        }

        let event = NotificationEvent::InviteAnswer {
            question_id: "101q1".to_string(),
            question_title: "Why?".to_string(),
            inviter_id: "inviter".to_string(),
            invitee_ids: vec!["inviter".to_string(), "x".to_string(), "y".to_string()],
        };
        f.service.handle(&event).await.unwrap();

        let sent = f.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "x@example.com");
        assert!(sent[0].body.contains("User inviter"));
    }
}
