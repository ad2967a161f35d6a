//! Login token issuance and validation.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::domain::{User, UserId};

/// JWT claims carried by a login token. `jti` keys the server-side session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub jti: String,
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn user_id(&self) -> UserId {
        UserId(self.sub)
    }
}

/// A freshly issued login token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_in: i64,
    #[serde(skip)]
    pub claims: SessionClaims,
}

/// Signs and validates login tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, user: &User) -> Result<IssuedSession, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user.id.0,
            username: user.username.clone(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(IssuedSession {
            token,
            expires_in: self.ttl_secs,
            claims,
        })
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<SessionClaims>(
            token,
            &self.decoding_key,
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::now;

    fn user() -> User {
        User {
            id: UserId(7),
            username: "owner".to_string(),
            email: "owner@tramcar.org".to_string(),
            password_hash: String::new(),
            is_staff: false,
            created_at: now(),
        }
    }

    #[test]
    fn issued_tokens_validate() {
        let keys = SessionKeys::new(b"test-secret", 3600);
        let issued = keys.issue(&user()).expect("token issued");
        let claims = keys.validate(&issued.token).expect("token valid");
        assert_eq!(claims.user_id(), UserId(7));
        assert_eq!(claims.username, "owner");
        assert_eq!(claims, issued.claims);
        assert_eq!(issued.expires_in, 3600);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let issued = SessionKeys::new(b"one", 3600).issue(&user()).expect("issued");
        assert!(SessionKeys::new(b"two", 3600).validate(&issued.token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = SessionKeys::new(b"test-secret", -3600);
        let issued = keys.issue(&user()).expect("issued");
        assert!(keys.validate(&issued.token).is_err());
    }
}
