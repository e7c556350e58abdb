//! Periodic purge of expired password reset tokens.
//!
//! Expired tokens are already rejected on use; this job only keeps the
//! `reset_password_tokens` table from growing without bound.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::services::CredentialManager;

/// Run the purge loop every `every` until `cancel` is triggered.
pub async fn run(credentials: CredentialManager, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Reset token purge job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reset token purge job stopping");
                break;
            }
            _ = interval.tick() => {
                match credentials.purge_expired_tokens().await {
                    Ok(purged) if purged > 0 => {
                        tracing::info!(purged, "Reset token purge: removed expired tokens");
                    }
                    Ok(_) => tracing::debug!("Reset token purge: nothing to remove"),
                    Err(e) => tracing::error!(error = %e, "Reset token purge failed"),
                }
            }
        }
    }
}

/// Spawn the purge loop; an interval of 0 seconds disables it.
pub fn spawn(
    credentials: CredentialManager,
    interval_secs: u64,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Reset token purge job disabled");
        return None;
    }

    Some(tokio::spawn(run(
        credentials,
        Duration::from_secs(interval_secs),
        cancel,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{HashScheme, JwtService, PasswordService};
    use crate::clock::FixedClock;
    use crate::repositories::{MemoryStore, NewUser, ResetTokenStore, UserStore};
    use crate::services::CredentialSettings;
    use chrono::{NaiveDate, Utc};
    use startkit_shared::ResetToken;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_disabled_when_interval_is_zero() {
        let store = MemoryStore::new();
        let manager = CredentialManager::new(
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(FixedClock::new(Utc::now())),
            JwtService::new("test-secret", "HS256", 30).unwrap(),
            CredentialSettings {
                reset_token_ttl: chrono::Duration::minutes(10),
                passwords: PasswordService::new(HashScheme::Bcrypt { cost: 4 }),
            },
        );

        assert!(spawn(manager, 0, CancellationToken::new()).is_none());
    }

    #[tokio::test]
    async fn test_first_tick_purges_and_cancel_stops() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let user = UserStore::insert(
            &store,
            NewUser {
                email: "a@example.com".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                social_name: None,
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();
        let expired = ResetToken::issue(
            user.id,
            now - chrono::Duration::hours(1),
            chrono::Duration::minutes(10),
        );
        ResetTokenStore::insert(&store, &expired).await.unwrap();

        let manager = CredentialManager::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(FixedClock::new(now)),
            JwtService::new("test-secret", "HS256", 30).unwrap(),
            CredentialSettings {
                reset_token_ttl: chrono::Duration::minutes(10),
                passwords: PasswordService::new(HashScheme::Bcrypt { cost: 4 }),
            },
        );

        let cancel = CancellationToken::new();
        let handle = spawn(manager, 3600, cancel.clone()).unwrap();

        // the first interval tick fires immediately
        for _ in 0..50 {
            if store.token_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.token_count().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
