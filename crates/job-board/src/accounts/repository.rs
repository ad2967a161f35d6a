//! User, token balance and session queries.

use super::domain::{User, UserId, UserRow, UserToken};
use crate::storage::{now, to_unix, Database, DatabaseError};

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DatabaseError> {
        let id = sqlx::query(
            "INSERT INTO users (username, email, password_hash, is_staff, created_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(to_unix(now()))
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        self.get_user(UserId(id)).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .map(User::from)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(User::from))
    }

    pub async fn set_staff(&self, id: UserId, is_staff: bool) -> Result<User, DatabaseError> {
        sqlx::query("UPDATE users SET is_staff = ? WHERE id = ?")
            .bind(is_staff)
            .bind(id)
            .execute(self.pool())
            .await?;
        self.get_user(id).await
    }

    // =========================================================================
    // Token balance queries
    // =========================================================================

    /// Current balance; users without a balance row hold zero tokens.
    pub async fn user_tokens(&self, user_id: UserId) -> Result<UserToken, DatabaseError> {
        let balance = sqlx::query_as::<_, UserToken>(
            "SELECT user_id, tokens FROM user_tokens WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(balance.unwrap_or(UserToken { user_id, tokens: 0 }))
    }

    pub async fn set_user_tokens(
        &self,
        user_id: UserId,
        tokens: i64,
    ) -> Result<UserToken, DatabaseError> {
        sqlx::query(
            "INSERT INTO user_tokens (user_id, tokens) VALUES (?, ?) \
             ON CONFLICT (user_id) DO UPDATE SET tokens = excluded.tokens",
        )
        .bind(user_id)
        .bind(tokens.max(0))
        .execute(self.pool())
        .await?;
        self.user_tokens(user_id).await
    }

    /// Spend one token. Returns `false` (and changes nothing) at a zero balance.
    pub async fn deduct_user_token(&self, user_id: UserId) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("UPDATE user_tokens SET tokens = tokens - 1 WHERE user_id = ? AND tokens > 0")
                .bind(user_id)
                .execute(self.pool())
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn refund_user_token(&self, user_id: UserId) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user_tokens (user_id, tokens) VALUES (?, 1) \
             ON CONFLICT (user_id) DO UPDATE SET tokens = tokens + 1",
        )
        .bind(user_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    // =========================================================================
    // Session queries
    // =========================================================================

    pub async fn create_session(
        &self,
        id: &str,
        user_id: UserId,
        expires_at: i64,
    ) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(user_id)
            .bind(expires_at)
            .bind(to_unix(now()))
            .execute(self.pool())
            .await?;
        Ok(())
    }

    pub async fn session_is_live(&self, id: &str) -> Result<bool, DatabaseError> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT id FROM sessions WHERE id = ? AND expires_at > ?")
                .bind(id)
                .bind(to_unix(now()))
                .fetch_optional(self.pool())
                .await?;
        Ok(found.is_some())
    }

    /// Delete every session whose expiry is at or before `at` (Unix seconds).
    pub async fn prune_sessions(&self, at: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(at)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_session(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
