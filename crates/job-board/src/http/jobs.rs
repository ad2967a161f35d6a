use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::extract::{CurrentTenant, CurrentUser, MaybeUser};
use super::views::{can_manage, summaries, JobDetail};
use super::{moved_permanently, see_other, PageQuery, JOBS_ON_FRONT_PAGE, JOBS_PER_PAGE};
use crate::accounts::User;
use crate::board::JobBoard;
use crate::catalog::{self, Job, JobDraft, JobId, PageWindow};
use crate::error::AppError;
use crate::tenancy::Tenant;

pub(crate) async fn index(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
) -> Result<Json<serde_json::Value>, AppError> {
    let jobs = board
        .db
        .latest_active_jobs(tenant.id(), JOBS_ON_FRONT_PAGE)
        .await?;
    Ok(Json(json!({
        "title": "Latest Jobs",
        "jobs": summaries(&jobs),
    })))
}

pub(crate) async fn mine(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let total = board.db.count_jobs_for_user(tenant.id(), user.id).await?;
    let window = PageWindow::resolve(query.page.as_deref(), total, JOBS_PER_PAGE);
    let jobs = board
        .db
        .jobs_for_user(tenant.id(), user.id, window.limit, window.offset)
        .await?;
    Ok(Json(json!({
        "title": "My Jobs",
        "jobs": window.page(summaries(&jobs), total),
    })))
}

pub(crate) async fn create(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Json(draft): Json<JobDraft>,
) -> Result<Response, AppError> {
    let job = catalog::create_job(&board.db, &tenant, user.id, draft).await?;
    board.notify_new_job(&tenant, &job).await;

    let body = json!({
        "message": "Your job has been successfully added",
        "job": JobDetail::new(&tenant, &job, Some(&user)),
    });
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, job.path())],
        Json(body),
    )
        .into_response())
}

pub(crate) async fn show_redirect(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let job = visible_job(&board, &tenant, viewer.as_ref(), JobId(id)).await?;
    Ok(moved_permanently(job.path()))
}

/// The slug is cosmetic; any slug renders the job.
pub(crate) async fn show(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    MaybeUser(viewer): MaybeUser,
    Path((id, _slug)): Path<(i64, String)>,
) -> Result<Json<JobDetail>, AppError> {
    let job = visible_job(&board, &tenant, viewer.as_ref(), JobId(id)).await?;
    Ok(Json(JobDetail::new(&tenant, &job, viewer.as_ref())))
}

pub(crate) async fn update(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<i64>,
    Json(draft): Json<JobDraft>,
) -> Result<Response, AppError> {
    let job = board.db.get_job(tenant.id(), JobId(id)).await?;
    if job.user_id != user.id {
        return Ok(see_other(job.path(), None));
    }

    let job = catalog::update_job(&board.db, &tenant, job.id, draft).await?;
    let body = json!({
        "message": "Your job has been successfully updated",
        "job": JobDetail::new(&tenant, &job, Some(&user)),
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn activate(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !user.is_staff {
        return Err(AppError::Forbidden);
    }
    let mut job = board.db.get_job(tenant.id(), JobId(id)).await?;
    let message = if board.lifecycle.activate(&tenant, &mut job).await? {
        "The job has been activated"
    } else {
        "The job was already active"
    };
    Ok(see_other(job.path(), Some(message)))
}

pub(crate) async fn expire(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let mut job = board.db.get_job(tenant.id(), JobId(id)).await?;
    if job.user_id != user.id {
        return Ok(see_other(job.path(), None));
    }
    let message = if board.lifecycle.expire(&tenant, &mut job).await? {
        "Your job has been expired"
    } else {
        "Only active jobs can be expired"
    };
    Ok(see_other(job.path(), Some(message)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChargeCardForm {
    job_id: JobId,
    #[serde(alias = "stripeToken")]
    token: String,
}

pub(crate) async fn charge_card(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Json(form): Json<ChargeCardForm>,
) -> Result<Response, AppError> {
    if form.token.trim().is_empty() {
        return Err(AppError::BadRequest("a card token is required".to_string()));
    }
    let (job, receipt) = board
        .payments
        .charge_card(&tenant, &user, form.job_id, &form.token)
        .await?;
    let body = json!({
        "message": "Thank you, your payment was received and your job is now live",
        "charge_id": receipt.id,
        "amount_in_cents": receipt.amount_cents,
    });
    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, job.path())], Json(body)).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChargeTokenForm {
    job_id: JobId,
}

pub(crate) async fn charge_token(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Json(form): Json<ChargeTokenForm>,
) -> Result<Response, AppError> {
    let (job, balance) = board
        .payments
        .redeem_token(&tenant, &user, form.job_id)
        .await?;
    let body = json!({
        "message": "Your job is now live",
        "tokens_remaining": balance.tokens,
    });
    Ok((StatusCode::SEE_OTHER, [(header::LOCATION, job.path())], Json(body)).into_response())
}

/// Unpaid jobs exist only for their owner and staff.
async fn visible_job(
    board: &JobBoard,
    tenant: &Tenant,
    viewer: Option<&User>,
    id: JobId,
) -> Result<Job, AppError> {
    let job = board.db.get_job(tenant.id(), id).await?;
    if !job.is_paid() && !can_manage(viewer, &job) {
        return Err(AppError::not_found(format!("Job {id}")));
    }
    Ok(job)
}
