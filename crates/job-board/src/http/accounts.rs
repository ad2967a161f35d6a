use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::extract::{CurrentTenant, CurrentUser};
use super::see_other;
use crate::accounts::{IssuedSession, Registration};
use crate::board::JobBoard;
use crate::error::AppError;

pub(crate) async fn register(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(_): CurrentTenant,
    Json(form): Json<Registration>,
) -> Result<Response, AppError> {
    let user = board.accounts.register(form).await?;
    let message = format!("Account {} created, you can now log in", user.username);
    Ok(see_other("/jobs".to_string(), Some(&message)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginForm {
    username: String,
    password: String,
}

pub(crate) async fn login(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(_): CurrentTenant,
    Json(form): Json<LoginForm>,
) -> Result<Json<IssuedSession>, AppError> {
    let session = board.accounts.login(&form.username, &form.password).await?;
    Ok(Json(session))
}

pub(crate) async fn logout(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(_): CurrentTenant,
    CurrentUser { claims, .. }: CurrentUser,
) -> Result<Response, AppError> {
    board.accounts.logout(&claims).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
