//! Refresh token table operations

use sqlx::SqlitePool;

use super::ensure_exists;
use crate::db::store::{refresh_token_digest, StoreError, StoreResult};

/// Refresh token table operations
pub struct RefreshTokenTable;

impl RefreshTokenTable {
    /// Record a freshly issued refresh token for the user
    pub async fn insert(pool: &SqlitePool, user_id: &str, token: &str) -> StoreResult<()> {
        let mut conn = pool.acquire().await?;
        ensure_exists(&mut *conn, "user", user_id).await?;

        sqlx::query(
            "INSERT OR IGNORE INTO refresh_token (user_id, token_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(refresh_token_digest(token))
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Swap one token for another in a single transaction
    pub async fn replace(
        pool: &SqlitePool,
        user_id: &str,
        old_token: &str,
        new_token: &str,
    ) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM refresh_token WHERE user_id = ? AND token_hash = ?")
            .bind(user_id)
            .bind(refresh_token_digest(old_token))
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("refresh token", user_id));
        }

        sqlx::query("INSERT INTO refresh_token (user_id, token_hash, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(refresh_token_digest(new_token))
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete(pool: &SqlitePool, user_id: &str, token: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM refresh_token WHERE user_id = ? AND token_hash = ?")
            .bind(user_id)
            .bind(refresh_token_digest(token))
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("refresh token", user_id));
        }

        Ok(())
    }
}
