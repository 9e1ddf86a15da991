//! User lookups used by authentication.

use std::sync::Arc;

use agora_common::{AppError, AppResult, ForbiddenKind};
use agora_db::{
    entities::user::{self, MailStatus, UserStatus},
    repositories::UserStore,
};
use tracing::debug;

/// User service.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.users
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }

    /// Authenticate a user by token.
    ///
    /// Unknown tokens are `Unauthorized`; known accounts that may not act
    /// are refused with the reason.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .users
            .find_user_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let restriction = match (user.status, user.mail_status) {
            (UserStatus::Deleted, _) => Some(ForbiddenKind::Deleted),
            (UserStatus::Suspended, _) => Some(ForbiddenKind::Suspended),
            (UserStatus::Available, MailStatus::ToBeVerified) => Some(ForbiddenKind::Inactive),
            (UserStatus::Available, MailStatus::Available) => None,
        };
        if let Some(kind) = restriction {
            debug!(user_id = %user.id, kind = kind.as_str(), "Restricted account refused");
            return Err(AppError::AccountRestricted(kind));
        }
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{seeded_store, user_fixture};
    use agora_db::entities::user::UserRole;

    #[tokio::test]
    async fn test_authenticate_by_token_found() {
        let store = seeded_store();
        store.put_user(user_fixture("u1", UserRole::User, 1)).await;
        let service = UserService::new(store);

        let user = service.authenticate_by_token("token-u1").await.unwrap();
        assert_eq!(user.id, "u1");
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let service = UserService::new(seeded_store());
        assert!(matches!(
            service.authenticate_by_token("nope").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_restricted_accounts_report_kind() {
        let store = seeded_store();
        let mut inactive = user_fixture("inactive", UserRole::User, 1);
        inactive.mail_status = MailStatus::ToBeVerified;
        let mut suspended = user_fixture("suspended", UserRole::User, 1);
        suspended.status = UserStatus::Suspended;
        let mut deleted = user_fixture("deleted", UserRole::User, 1);
        deleted.status = UserStatus::Deleted;
        deleted.mail_status = MailStatus::ToBeVerified;
        for user in [inactive, suspended, deleted] {
            store.put_user(user).await;
        }
        let service = UserService::new(store);

        for (token, kind) in [
            ("token-inactive", ForbiddenKind::Inactive),
            ("token-suspended", ForbiddenKind::Suspended),
            ("token-deleted", ForbiddenKind::Deleted),
        ] {
            let err = service.authenticate_by_token(token).await.unwrap_err();
            assert!(matches!(err, AppError::AccountRestricted(k) if k == kind), "{token}");
        }
    }
}
