use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::from_unix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered account. Users are global; their companies and jobs are per site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            is_staff: row.is_staff,
            created_at: from_unix(row.created_at),
        }
    }
}

/// Pre-purchased credits that activate a job without a card charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserToken {
    pub user_id: UserId,
    pub tokens: i64,
}

impl UserToken {
    pub fn can_redeem(&self) -> bool {
        self.tokens > 0
    }
}

/// Registration form payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password1: String,
    pub password2: String,
}

pub const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_USERNAME_LENGTH: usize = 150;

impl Registration {
    /// Returns the first problem found, mirroring how a form reports errors.
    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username is required".to_string());
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(format!(
                "username must be at most {MAX_USERNAME_LENGTH} characters"
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(
                "username may only contain letters, digits and @/./+/-/_ characters".to_string(),
            );
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(format!("'{}' is not a valid e-mail address", self.email));
        }
        if self.password1 != self.password2 {
            return Err("the two password fields didn't match".to_string());
        }
        if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "password must contain at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        Ok(())
    }
}
