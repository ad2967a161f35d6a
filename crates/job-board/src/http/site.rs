use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::extract::{CurrentTenant, CurrentUser};
use super::see_other;
use crate::accounts::User;
use crate::board::{Feedback, JobBoard};
use crate::catalog::validate_email;
use crate::error::AppError;
use crate::tenancy::{configure_site, SiteConfig, SiteConfigUpdate};

pub(crate) async fn contact(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Json(feedback): Json<Feedback>,
) -> Result<Response, AppError> {
    feedback.validate().map_err(AppError::BadRequest)?;
    board.send_feedback(&tenant, &feedback).await;
    Ok(see_other(
        "/jobs".to_string(),
        Some("Thank you for your feedback"),
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeForm {
    email: String,
}

pub(crate) async fn subscribe(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Json(form): Json<SubscribeForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    validate_email(&form.email).map_err(AppError::BadRequest)?;
    if !board.subscribe(&tenant, &form.email).await? {
        return Err(AppError::not_found("Mailing list"));
    }
    Ok(Json(json!({
        "message": "Almost finished, please check your inbox to confirm your subscription",
    })))
}

pub(crate) async fn show_config(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<Json<SiteConfig>, AppError> {
    require_staff(&user)?;
    Ok(Json(board.db.site_config(tenant.id()).await?))
}

pub(crate) async fn update_config(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Json(update): Json<SiteConfigUpdate>,
) -> Result<Json<SiteConfig>, AppError> {
    require_staff(&user)?;
    let config = configure_site(&board.db, tenant.id(), update).await?;
    Ok(Json(config))
}

fn require_staff(user: &User) -> Result<(), AppError> {
    if user.is_staff {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
