//! In-memory store implementing both [`UserStore`] and [`ResetTokenStore`]
//!
//! Users and tokens share one lock, so `consume` and the delete cascade are
//! atomic just like their PostgreSQL counterparts. Cloning shares the data.

use super::{DuplicateEmail, NewUser, ResetTokenStore, UserStore, UserUpdate};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use startkit_shared::{ResetToken, User};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    tokens: HashMap<String, ResetToken>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|user| user.email == email && Some(user.id) != except)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reset tokens currently stored
    pub async fn token_count(&self) -> usize {
        self.tables.read().await.tokens.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, new_user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&new_user.email, None) {
            return Err(DuplicateEmail.into());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            social_name: new_user.social_name,
            date_of_birth: new_user.date_of_birth,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.tables.read().await.email_taken(email, None))
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Ok(None);
        }
        if tables.email_taken(&update.email, Some(id)) {
            return Err(DuplicateEmail.into());
        }

        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        user.email = update.email;
        user.first_name = update.first_name;
        user.last_name = update.last_name;
        if let Some(social_name) = update.social_name {
            user.social_name = social_name;
        }
        user.date_of_birth = update.date_of_birth;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.users.remove(&id).is_some();
        if removed {
            tables.tokens.retain(|_, token| token.user_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl ResetTokenStore for MemoryStore {
    async fn insert(&self, token: &ResetToken) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&token.user_id) {
            anyhow::bail!("reset token references unknown user {}", token.user_id);
        }
        if tables.tokens.contains_key(&token.token) {
            anyhow::bail!("duplicate reset token");
        }
        tables.tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<ResetToken>> {
        Ok(self.tables.read().await.tokens.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        Ok(self.tables.write().await.tokens.remove(token).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn consume(&self, token: &str, password_hash: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let Some(user_id) = tables.tokens.get(token).map(|t| t.user_id) else {
            return Ok(false);
        };
        let Some(user) = tables.users.get_mut(&user_id) else {
            return Ok(false);
        };

        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        tables.tokens.remove(token);

        Ok(true)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.tokens.len();
        tables.tokens.retain(|_, token| !token.is_expired_at(now));
        Ok((before - tables.tokens.len()) as u64)
    }
}
