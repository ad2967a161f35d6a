//! Registration, login sessions and token balances.

pub mod domain;
pub mod password;
pub mod repository;
pub mod session;

pub use domain::{Registration, User, UserId, UserToken, MIN_PASSWORD_LENGTH};
pub use session::{IssuedSession, SessionClaims, SessionKeys};

use tracing::{debug, info};

use crate::storage::{now, to_unix, Database, DatabaseError};

/// Error raised by account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Invalid(String),
    #[error("a user with that username already exists")]
    UsernameTaken,
    #[error("please enter a correct username and password")]
    InvalidCredentials,
    #[error("authentication required")]
    Unauthenticated,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for AccountError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::Conflict(_) => Self::UsernameTaken,
            other => Self::Database(other),
        }
    }
}

/// Account service composing the database with session signing keys.
#[derive(Clone, Debug)]
pub struct Accounts {
    db: Database,
    keys: SessionKeys,
}

impl Accounts {
    pub fn new(db: Database, keys: SessionKeys) -> Self {
        Self { db, keys }
    }

    pub async fn register(&self, form: Registration) -> Result<User, AccountError> {
        form.validate().map_err(AccountError::Invalid)?;

        let username = form.username.trim();
        if self.db.user_by_username(username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }

        let hash = password::hash_password(&form.password1)
            .map_err(|err| AccountError::Hashing(err.to_string()))?;
        let user = self
            .db
            .create_user(username, form.email.trim(), &hash)
            .await?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AccountError> {
        let user = self
            .db
            .user_by_username(username.trim())
            .await?
            .ok_or(AccountError::InvalidCredentials)?;

        if !password::verify_password(password, &user.password_hash) {
            debug!(username = %user.username, "rejected login attempt");
            return Err(AccountError::InvalidCredentials);
        }

        let pruned = self.db.prune_sessions(to_unix(now())).await?;
        if pruned > 0 {
            debug!(pruned, "expired sessions removed");
        }

        let issued = self.keys.issue(&user)?;
        self.db
            .create_session(&issued.claims.jti, user.id, issued.claims.exp)
            .await?;

        info!(user_id = %user.id, "user logged in");
        Ok(issued)
    }

    /// Resolve a bearer token to its user; revoked or expired sessions fail.
    pub async fn authenticate(&self, token: &str) -> Result<(User, SessionClaims), AccountError> {
        let claims = self
            .keys
            .validate(token)
            .map_err(|_| AccountError::Unauthenticated)?;

        if !self.db.session_is_live(&claims.jti).await? {
            return Err(AccountError::Unauthenticated);
        }

        let user = match self.db.get_user(claims.user_id()).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => return Err(AccountError::Unauthenticated),
            Err(other) => return Err(other.into()),
        };
        Ok((user, claims))
    }

    pub async fn logout(&self, claims: &SessionClaims) -> Result<(), AccountError> {
        self.db.delete_session(&claims.jti).await?;
        info!(user_id = claims.sub, "user logged out");
        Ok(())
    }
}
