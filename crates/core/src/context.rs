//! Per-request caller information.

use agora_common::{AppError, AppResult};
use agora_db::entities::user::{self, UserRole};

/// Who is calling and in which language they want answers.
///
/// Built by the API extractors and passed down by parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// `None` for anonymous visitors.
    pub user_id: Option<String>,
    pub role: UserRole,
    /// Reputation of the caller at the time of the request.
    pub rank: i32,
    pub language: String,
    pub request_id: String,
}

impl RequestContext {
    /// Context of an anonymous visitor.
    #[must_use]
    pub fn anonymous(language: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            role: UserRole::User,
            rank: 0,
            language: language.into(),
            request_id: request_id.into(),
        }
    }

    /// Context of an authenticated user.
    #[must_use]
    pub fn for_user(user: &user::Model, request_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user.id.clone()),
            role: user.role,
            rank: user.rank,
            language: user.language.clone(),
            request_id: request_id.into(),
        }
    }

    /// Override the language, e.g. from an `Accept-Language` header.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Whether the caller is `user_id`.
    #[must_use]
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Caller id, or `Unauthorized` for anonymous visitors.
    pub fn require_user(&self) -> AppResult<&str> {
        self.user_id.as_deref().ok_or(AppError::Unauthorized)
    }
}
