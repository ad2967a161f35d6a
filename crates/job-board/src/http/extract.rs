//! Request extractors resolving the tenant and the authenticated user.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, HOST};
use axum::http::request::Parts;

use crate::accounts::{AccountError, SessionClaims, User};
use crate::board::JobBoard;
use crate::error::AppError;
use crate::tenancy::Tenant;

/// Site selected by the request's `Host` header. Unknown hosts are 404.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub Tenant);

#[async_trait]
impl FromRequestParts<Arc<JobBoard>> for CurrentTenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        board: &Arc<JobBoard>,
    ) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| parts.uri.host())
            .ok_or_else(|| AppError::not_found("Site"))?;

        board
            .db
            .tenant_for_host(host)
            .await?
            .map(CurrentTenant)
            .ok_or_else(|| AppError::not_found("Site"))
    }
}

/// Authenticated user; requests without a live session are 401.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub claims: SessionClaims,
}

#[async_trait]
impl FromRequestParts<Arc<JobBoard>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        board: &Arc<JobBoard>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        match board.accounts.authenticate(token).await {
            Ok((user, claims)) => Ok(CurrentUser { user, claims }),
            Err(AccountError::Unauthenticated) => Err(AppError::Unauthorized),
            Err(other) => Err(other.into()),
        }
    }
}

/// Like [`CurrentUser`] but anonymous requests (or stale tokens) yield `None`.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<JobBoard>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        board: &Arc<JobBoard>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeUser(None));
        };
        match board.accounts.authenticate(token).await {
            Ok((user, _)) => Ok(MaybeUser(Some(user))),
            Err(AccountError::Unauthenticated) => Ok(MaybeUser(None)),
            Err(other) => Err(other.into()),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
