//! Database repositories
//!
//! The credential manager and user service only see the [`UserStore`] and
//! [`ResetTokenStore`] traits. PostgreSQL implementations back production;
//! [`MemoryStore`] implements both for tests and local runs.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use startkit_shared::{ResetToken, User};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod reset_token;
pub mod user;

pub use memory::MemoryStore;
pub use reset_token::PgResetTokenRepository;
pub use user::PgUserRepository;

/// Raised by stores when an email is already taken by another account
#[derive(Debug, Error)]
#[error("email already registered")]
pub struct DuplicateEmail;

/// Input for creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub social_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub password_hash: String,
}

/// Profile fields to write
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `None` keeps the stored value; `Some(None)` clears it
    pub social_name: Option<Option<String>>,
    pub date_of_birth: NaiveDate,
}

/// Credential store: user accounts keyed by id and by email
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with [`DuplicateEmail`] if the email is taken.
    async fn insert(&self, new_user: NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Exact, case-sensitive email match
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Write profile fields. Returns `None` if the user does not exist.
    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>>;

    /// Cheap query proving the backing table is reachable
    async fn ping(&self) -> Result<()>;

    /// Delete a user and, by cascade, their reset tokens. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Token store: reset tokens keyed by token string
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn insert(&self, token: &ResetToken) -> Result<()>;

    async fn find(&self, token: &str) -> Result<Option<ResetToken>>;

    async fn delete(&self, token: &str) -> Result<bool>;

    async fn ping(&self) -> Result<()>;

    /// Atomically delete `token` and overwrite its owner's password hash.
    ///
    /// Returns `false` without touching the user when the token no longer
    /// exists, e.g. because a concurrent request consumed it first.
    async fn consume(&self, token: &str, password_hash: &str) -> Result<bool>;

    /// Delete every token whose expiry is at or before `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
