//! PostgreSQL reset token repository

use super::ResetTokenStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use startkit_shared::ResetToken;
use uuid::Uuid;

/// Reset token record from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResetTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<ResetTokenRecord> for ResetToken {
    fn from(record: ResetTokenRecord) -> Self {
        ResetToken {
            token: record.token,
            user_id: record.user_id,
            expires_at: record.expires_at,
            created_at: record.created_at,
        }
    }
}

/// Reset token repository backed by the `reset_password_tokens` table
#[derive(Clone)]
pub struct PgResetTokenRepository {
    pool: PgPool,
}

impl PgResetTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenStore for PgResetTokenRepository {
    async fn insert(&self, token: &ResetToken) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reset_password_tokens (token, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<ResetToken>> {
        let record = sqlx::query_as::<_, ResetTokenRecord>(
            r#"
            SELECT token, user_id, expires_at, created_at
            FROM reset_password_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(ResetToken::from))
    }

    async fn delete(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM reset_password_tokens WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn consume(&self, token: &str, password_hash: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // A concurrent consumer blocks on the row lock and then sees no row
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            DELETE FROM reset_password_tokens
            WHERE token = $1
            RETURNING user_id
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            tx.rollback().await?;
            return Ok(false);
        };

        let updated = sqlx::query(
            r#"
            UPDATE users SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1 FROM reset_password_tokens LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM reset_password_tokens WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
