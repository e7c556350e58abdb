//! Credential and reset-token management
//!
//! `CredentialManager` owns everything secret-bearing: it verifies
//! passwords, signs access tokens and runs the reset-token lifecycle
//! (issue, expiry check, single-use consumption). It talks to storage only
//! through the [`UserStore`] and [`ResetTokenStore`] traits and reads time
//! from a [`Clock`], so it runs unchanged against PostgreSQL or memory.

use crate::auth::{JwtService, PasswordService};
use crate::clock::Clock;
use crate::error::ApiError;
use crate::repositories::{ResetTokenStore, UserStore};
use chrono::Duration;
use startkit_shared::{
    validation::{validate_email, validate_password},
    AccessToken, AuthError, ResetToken, BEARER_TOKEN_TYPE,
};
use std::sync::Arc;
use tracing::{info, warn};
use validator::ValidationErrors;

/// Construction-time settings for [`CredentialManager`]
#[derive(Debug, Clone, Copy)]
pub struct CredentialSettings {
    pub reset_token_ttl: Duration,
    pub passwords: PasswordService,
}

/// Verifies credentials and manages password reset tokens
#[derive(Clone)]
pub struct CredentialManager {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn ResetTokenStore>,
    clock: Arc<dyn Clock>,
    jwt: JwtService,
    settings: CredentialSettings,
}

impl CredentialManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn ResetTokenStore>,
        clock: Arc<dyn Clock>,
        jwt: JwtService,
        settings: CredentialSettings,
    ) -> Self {
        Self {
            users,
            tokens,
            clock,
            jwt,
            settings,
        }
    }

    pub fn passwords(&self) -> PasswordService {
        self.settings.passwords
    }

    /// Check an email/password pair and issue an access token.
    ///
    /// Unknown emails and wrong passwords fail identically.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccessToken, ApiError> {
        let user = match self
            .users
            .find_by_email(email)
            .await
            .map_err(ApiError::Internal)?
        {
            Some(user) => user,
            None => {
                record_login("unknown_user");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let valid = PasswordService::verify_async(password.to_string(), user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            record_login("wrong_password");
            info!(user_id = %user.id, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self
            .jwt
            .generate_access_token(&user, self.clock.now())
            .map_err(ApiError::Internal)?;

        record_login("success");
        info!(user_id = %user.id, "User logged in");

        Ok(AccessToken {
            token,
            token_type: BEARER_TOKEN_TYPE.to_string(),
            expires_in: self.jwt.access_token_expiry_minutes(),
        })
    }

    /// Issue a reset token for the account behind `email`.
    ///
    /// Returns `None` when no account matches; callers must not reveal the
    /// difference to clients.
    pub async fn issue_reset_token(&self, email: &str) -> Result<Option<String>, ApiError> {
        validate_field("email", email, validate_email)?;
        metrics::counter!("auth_password_reset_requests_total").increment(1);

        let Some(user) = self
            .users
            .find_by_email(email)
            .await
            .map_err(ApiError::Internal)?
        else {
            info!("Password reset requested for unknown email");
            return Ok(None);
        };

        let token = ResetToken::issue(user.id, self.clock.now(), self.settings.reset_token_ttl);
        self.tokens
            .insert(&token)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, expires_at = %token.expires_at, "Reset token issued");

        Ok(Some(token.token))
    }

    /// Redeem a reset token and replace its owner's password.
    pub async fn change_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        validate_field("new_password", new_password, validate_password)?;

        let Some(reset_token) = self.tokens.find(token).await.map_err(ApiError::Internal)? else {
            record_password_change("invalid_token");
            return Err(AuthError::InvalidToken.into());
        };

        if reset_token.is_expired_at(self.clock.now()) {
            record_password_change("expired_token");
            info!(user_id = %reset_token.user_id, "Expired reset token presented");
            return Err(AuthError::TokenExpired.into());
        }

        let password_hash = self
            .settings
            .passwords
            .hash_async(new_password.to_string())
            .await
            .map_err(ApiError::Internal)?;

        let consumed = self
            .tokens
            .consume(token, &password_hash)
            .await
            .map_err(ApiError::Internal)?;
        if !consumed {
            record_password_change("invalid_token");
            warn!(user_id = %reset_token.user_id, "Reset token consumed concurrently");
            return Err(AuthError::InvalidToken.into());
        }

        record_password_change("success");
        info!(user_id = %reset_token.user_id, "Password changed");

        Ok(())
    }

    /// Delete reset tokens that expired at or before the current instant
    pub async fn purge_expired_tokens(&self) -> anyhow::Result<u64> {
        let purged = self.tokens.purge_expired(self.clock.now()).await?;
        if purged > 0 {
            metrics::counter!("auth_reset_tokens_purged_total").increment(purged);
        }
        Ok(purged)
    }
}

fn validate_field(
    field: &'static str,
    value: &str,
    check: fn(&str) -> Result<(), validator::ValidationError>,
) -> Result<(), ApiError> {
    check(value).map_err(|error| {
        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        ApiError::from(errors)
    })
}

fn record_login(outcome: &'static str) {
    metrics::counter!("auth_login_total", "outcome" => outcome).increment(1);
}

fn record_password_change(outcome: &'static str) {
    metrics::counter!("auth_password_changes_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HashScheme;
    use crate::clock::FixedClock;
    use crate::repositories::{MemoryStore, NewUser};
    use chrono::{NaiveDate, Utc};
    use startkit_shared::User;

    const SECRET: &str = "test-secret-key-for-testing-only-32chars";

    struct Harness {
        manager: CredentialManager,
        store: MemoryStore,
        clock: FixedClock,
        jwt: JwtService,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let clock = FixedClock::new(Utc::now());
        let jwt = JwtService::new(SECRET, "HS256", 30).unwrap();
        let manager = CredentialManager::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            jwt.clone(),
            CredentialSettings {
                reset_token_ttl: Duration::minutes(10),
                passwords: PasswordService::new(HashScheme::Bcrypt { cost: 4 }),
            },
        );
        Harness {
            manager,
            store,
            clock,
            jwt,
        }
    }

    async fn seed_user(h: &Harness, email: &str, password: &str) -> User {
        let password_hash = h.manager.passwords().hash(password).unwrap();
        UserStore::insert(
            &h.store,
            NewUser {
                email: email.to_string(),
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                social_name: None,
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                password_hash,
            },
        )
        .await
        .unwrap()
    }

    fn error_body(err: ApiError) -> String {
        err.to_string()
    }

    #[tokio::test]
    async fn test_verify_credentials_issues_token_for_user() {
        let h = harness();
        let user = seed_user(&h, "a@x.com", "SecurePass!").await;

        let token = h.manager.verify_credentials("a@x.com", "SecurePass!").await.unwrap();

        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 30);
        let claims = h.jwt.validate_access_token(&token.token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.user.email, "a@x.com");
        assert_eq!(claims.exp, (h.clock.now() + Duration::minutes(30)).timestamp());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_identical() {
        let h = harness();
        seed_user(&h, "a@x.com", "SecurePass!").await;

        let wrong = h.manager.verify_credentials("a@x.com", "Wrong!").await.unwrap_err();
        let unknown = h
            .manager
            .verify_credentials("nobody@x.com", "SecurePass!")
            .await
            .unwrap_err();

        assert!(matches!(wrong, ApiError::InvalidCredentials));
        assert!(matches!(unknown, ApiError::InvalidCredentials));
        assert_eq!(error_body(wrong), "Incorrect username or password.");
        assert_eq!(error_body(unknown), "Incorrect username or password.");
    }

    #[tokio::test]
    async fn test_reset_flow_replaces_password_and_consumes_token() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;

        let token = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();
        h.manager.change_password(&token, "NewPass!").await.unwrap();

        assert!(h.manager.verify_credentials("a@x.com", "NewPass!").await.is_ok());
        assert!(matches!(
            h.manager.verify_credentials("a@x.com", "OldPass!").await,
            Err(ApiError::InvalidCredentials)
        ));
        assert!(h.store.find(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_reuse_is_invalid() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;
        let token = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();

        h.manager.change_password(&token, "NewPass!").await.unwrap();
        let second = h.manager.change_password(&token, "Other!1").await.unwrap_err();

        assert!(matches!(second, ApiError::InvalidToken));
        assert!(h.manager.verify_credentials("a@x.com", "NewPass!").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_token_leaves_password_unchanged() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;
        let token = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();

        h.clock.advance(Duration::minutes(10));
        let err = h.manager.change_password(&token, "NewPass!").await.unwrap_err();

        assert!(matches!(err, ApiError::TokenExpired));
        assert!(h.manager.verify_credentials("a@x.com", "OldPass!").await.is_ok());
    }

    #[tokio::test]
    async fn test_token_still_valid_just_before_expiry() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;
        let token = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();

        h.clock.advance(Duration::minutes(10) - Duration::seconds(1));
        assert!(h.manager.change_password(&token, "NewPass!").await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let h = harness();
        let err = h
            .manager
            .change_password("00000000-0000-0000-0000-000000000000", "NewPass!")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken));
    }

    #[tokio::test]
    async fn test_weak_new_password_rejected_before_token_lookup() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;
        let token = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();

        let err = h.manager.change_password(&token, "short").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref msg) if msg.contains("at least 6")));

        let err = h.manager.change_password(&token, "NoSpecial1").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref msg) if msg.contains("special character")));

        // token survives the rejected attempts
        assert!(h.store.find(&token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reset_for_unknown_email_issues_nothing() {
        let h = harness();
        assert_eq!(h.manager.issue_reset_token("nobody@x.com").await.unwrap(), None);
        assert_eq!(h.store.token_count().await, 0);
    }

    #[tokio::test]
    async fn test_reset_rejects_malformed_email() {
        let h = harness();
        let err = h.manager.issue_reset_token("not-an-email").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref msg) if msg == "The email is not valid."));
    }

    #[tokio::test]
    async fn test_multiple_outstanding_tokens_are_independent() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;
        let first = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();
        let second = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();
        assert_ne!(first, second);

        h.manager.change_password(&second, "NewPass!").await.unwrap();
        h.manager.change_password(&first, "Newer!Pass").await.unwrap();

        assert!(h.manager.verify_credentials("a@x.com", "Newer!Pass").await.is_ok());
    }

    #[tokio::test]
    async fn test_deleting_user_removes_tokens() {
        let h = harness();
        let user = seed_user(&h, "a@x.com", "OldPass!").await;
        let token = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();

        assert!(UserStore::delete(&h.store, user.id).await.unwrap());

        assert!(h.store.find(&token).await.unwrap().is_none());
        assert!(matches!(
            h.manager.change_password(&token, "NewPass!").await,
            Err(ApiError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_consumption_has_one_winner() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;
        let token = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();

        let (a, b) = tokio::join!(
            h.manager.change_password(&token, "First!Pass"),
            h.manager.change_password(&token, "Second!Pass"),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(ApiError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired_tokens() {
        let h = harness();
        seed_user(&h, "a@x.com", "OldPass!").await;
        let stale = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();
        h.clock.advance(Duration::minutes(15));
        let fresh = h.manager.issue_reset_token("a@x.com").await.unwrap().unwrap();

        assert_eq!(h.manager.purge_expired_tokens().await.unwrap(), 1);
        assert!(h.store.find(&stale).await.unwrap().is_none());
        assert!(h.store.find(&fresh).await.unwrap().is_some());
    }
}
