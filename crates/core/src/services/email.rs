//! Notification mail templates and unsubscribe codes.

use std::sync::Arc;
use std::time::Duration;

use agora_common::{AppError, AppResult, IdGenerator, SharedCache};
use agora_db::entities::user_notification_config::NotificationSource;
use serde::{Deserialize, Serialize};

use super::site_info::SiteInfoService;
use super::site_sections::SiteGeneral;
use crate::i18n::Translator;

fn unsubscribe_key(code: &str) -> String {
    format!("unsubscribe_code:{code}")
}

/// What an unsubscribe code switches off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeCode {
    pub user_id: String,
    pub source: NotificationSource,
}

/// Mail templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTemplate {
    NewQuestion {
        question_id: String,
        title: String,
    },
    NewAnswer {
        question_id: String,
        title: String,
        excerpt: String,
    },
    NewComment {
        question_id: String,
        excerpt: String,
    },
    InviteAnswer {
        question_id: String,
        title: String,
        inviter: String,
    },
}

impl MailTemplate {
    fn question_id(&self) -> &str {
        match self {
            Self::NewQuestion { question_id, .. }
            | Self::NewAnswer { question_id, .. }
            | Self::NewComment { question_id, .. }
            | Self::InviteAnswer { question_id, .. } => question_id,
        }
    }
}

/// Rendered subject and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub body: String,
}

/// Renders notification mails.
#[derive(Clone)]
pub struct EmailService {
    site_info: SiteInfoService,
    cache: SharedCache,
    translator: Arc<Translator>,
    /// Used until the general settings carry a site URL.
    fallback_url: String,
    fallback_name: String,
    unsubscribe_ttl: Duration,
    id_gen: IdGenerator,
}

impl EmailService {
    #[must_use]
    pub fn new(
        site_info: SiteInfoService,
        cache: SharedCache,
        translator: Arc<Translator>,
        fallback_url: impl Into<String>,
        fallback_name: impl Into<String>,
        unsubscribe_ttl: Duration,
    ) -> Self {
        Self {
            site_info,
            cache,
            translator,
            fallback_url: fallback_url.into().trim_end_matches('/').to_string(),
            fallback_name: fallback_name.into(),
            unsubscribe_ttl,
            id_gen: IdGenerator::new(),
        }
    }

    async fn site(&self) -> AppResult<(String, String)> {
        let general: SiteGeneral = self.site_info.get_section().await?;
        let name = if general.name.is_empty() {
            self.fallback_name.clone()
        } else {
            general.name
        };
        let url = if general.site_url.is_empty() {
            self.fallback_url.clone()
        } else {
            general.site_url
        };
        Ok((name, url))
    }

    /// Store a one-time unsubscribe code.
    pub async fn unsubscribe_code(&self, user_id: &str, source: NotificationSource) -> AppResult<String> {
        let code = self.id_gen.generate_token();
        let payload = serde_json::to_string(&UnsubscribeCode {
            user_id: user_id.to_string(),
            source,
        })
        .map_err(|e| AppError::Internal(e.to_string()))?;
        self.cache
            .set_string(&unsubscribe_key(&code), &payload, self.unsubscribe_ttl)
            .await?;
        Ok(code)
    }

    /// Consume an unsubscribe code. Unknown or expired codes yield `None`.
    pub async fn redeem_unsubscribe_code(&self, code: &str) -> AppResult<Option<UnsubscribeCode>> {
        let key = unsubscribe_key(code);
        let Some(raw) = self.cache.get_string(&key).await? else {
            return Ok(None);
        };
        self.cache.del(&key).await?;
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Render a template for one recipient, including their unsubscribe link.
    pub async fn render(
        &self,
        template: &MailTemplate,
        language: &str,
        recipient_id: &str,
        source: NotificationSource,
    ) -> AppResult<RenderedMail> {
        let (site_name, site_url) = self.site().await?;
        let site = site_name.as_str();
        let tr = |key: &str, args: &[(&str, &str)]| self.translator.tr_with(language, key, args);

        let (subject, headline, excerpt) = match template {
            MailTemplate::NewQuestion { title, .. } => (
                tr("mail.new_question.subject", &[("site", site), ("title", title.as_str())]),
                tr("mail.new_question.body", &[("title", title.as_str())]),
                None,
            ),
            MailTemplate::NewAnswer { title, excerpt, .. } => (
                tr("mail.new_answer.subject", &[("site", site), ("title", title.as_str())]),
                tr("mail.new_answer.body", &[("title", title.as_str())]),
                Some(excerpt.as_str()),
            ),
            MailTemplate::NewComment { excerpt, .. } => (
                tr("mail.new_comment.subject", &[("site", site)]),
                tr("mail.new_comment.body", &[]),
                Some(excerpt.as_str()),
            ),
            MailTemplate::InviteAnswer { title, inviter, .. } => (
                tr("mail.invite_answer.subject", &[("site", site), ("title", title.as_str())]),
                tr("mail.invite_answer.body", &[("inviter", inviter.as_str()), ("title", title.as_str())]),
                None,
            ),
        };

        let link = format!("{site_url}/questions/{}", template.question_id());
        let code = self.unsubscribe_code(recipient_id, source).await?;
        let unsubscribe = format!(
            "{site_url}/users/unsubscribe?code={}",
            urlencoding::encode(&code)
        );

        let mut body = format!("<p>{}</p>", escape_html(&headline));
        if let Some(excerpt) = excerpt {
            body.push_str(&format!("<blockquote>{}</blockquote>", escape_html(excerpt)));
        }
        body.push_str(&format!(
            "<p><a href=\"{link}\">{}</a></p><p><a href=\"{unsubscribe}\">{}</a></p>",
            escape_html(&tr("mail.view", &[("site", site)])),
            escape_html(&tr("mail.unsubscribe", &[])),
        ));

        Ok(RenderedMail { subject, body })
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::seeded_store;
    use crate::validation::Validator;
    use agora_common::MemoryCache;

    fn service() -> EmailService {
        let cache: SharedCache = Arc::new(MemoryCache::new());
        let translator = Arc::new(Translator::new());
        let site_info = SiteInfoService::new(
            seeded_store(),
            cache.clone(),
            Duration::from_secs(60),
            Validator::new(translator.clone()),
        );
        EmailService::new(
            site_info,
            cache,
            translator,
            "https://qa.example.com/",
            "Agora",
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_render_new_question() {
        let service = service();
        let mail = service
            .render(
                &MailTemplate::NewQuestion {
                    question_id: "101q".to_string(),
                    title: "Why <b>?".to_string(),
                },
                "en_US",
                "u1",
                NotificationSource::AllNewQuestion,
            )
            .await
            .unwrap();
        assert_eq!(mail.subject, "[Agora] New question: Why <b>?");
        assert!(mail.body.contains("Why &lt;b&gt;?"));
        assert!(mail.body.contains("https://qa.example.com/questions/101q"));
        assert!(mail.body.contains("https://qa.example.com/users/unsubscribe?code="));
    }

    #[tokio::test]
    async fn test_unsubscribe_code_is_single_use() {
        let service = service();
        let code = service
            .unsubscribe_code("u1", NotificationSource::Inbox)
            .await
            .unwrap();

        let redeemed = service.redeem_unsubscribe_code(&code).await.unwrap();
        assert_eq!(
            redeemed,
            Some(UnsubscribeCode {
                user_id: "u1".to_string(),
                source: NotificationSource::Inbox,
            })
        );
        assert!(service.redeem_unsubscribe_code(&code).await.unwrap().is_none());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"a&b "c""#), "a&amp;b &quot;c&quot;");
    }
}
