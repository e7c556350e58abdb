//! Application state management
//!
//! Shared resources handed to every request handler through Axum's state
//! extraction. Everything is created once at startup and is cheap to clone.

use crate::auth::{HashScheme, JwtService, PasswordService};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::repositories::{PgResetTokenRepository, PgUserRepository, ResetTokenStore, UserStore};
use crate::services::{CredentialManager, CredentialSettings};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
///
/// - `config`: Wrapped in Arc
/// - `jwt`: Pre-computed keys wrapped in Arc
/// - `users` / `tokens` / `credentials`: store handles behind Arc
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn ResetTokenStore>,
    credentials: CredentialManager,
    metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create the production state: PostgreSQL stores and the system clock
    pub fn new(db: PgPool, config: AppConfig) -> Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(PgUserRepository::new(db.clone()));
        let tokens: Arc<dyn ResetTokenStore> = Arc::new(PgResetTokenRepository::new(db));
        Self::with_stores(config, users, tokens, Arc::new(SystemClock))
    }

    /// Create a state over explicit stores and clock
    pub fn with_stores(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn ResetTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let jwt = JwtService::new(
            config.jwt.secret.expose_secret(),
            &config.jwt.algorithm,
            config.jwt.access_token_expiry_minutes,
        )?;

        let scheme = HashScheme::from_config(&config.password.algorithm, config.password.bcrypt_cost)?;
        if config.reset.token_ttl_minutes <= 0 {
            anyhow::bail!("reset.token_ttl_minutes must be positive");
        }

        let credentials = CredentialManager::new(
            users.clone(),
            tokens.clone(),
            clock,
            jwt.clone(),
            CredentialSettings {
                reset_token_ttl: chrono::Duration::minutes(config.reset.token_ttl_minutes),
                passwords: PasswordService::new(scheme),
            },
        );

        Ok(Self {
            config: Arc::new(config),
            jwt,
            users,
            tokens,
            credentials,
            metrics: None,
        })
    }

    /// Attach the Prometheus handle rendered at `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the JWT service
    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    #[inline]
    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    #[inline]
    pub fn reset_tokens(&self) -> &dyn ResetTokenStore {
        self.tokens.as_ref()
    }

    #[inline]
    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    #[inline]
    pub fn passwords(&self) -> PasswordService {
        self.credentials.passwords()
    }

    #[inline]
    pub fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}
