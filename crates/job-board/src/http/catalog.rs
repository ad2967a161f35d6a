use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::extract::{CurrentTenant, CurrentUser};
use super::views::{summaries, CategoryDetail, CategorySummary, CompanyDetail, CompanySummary};
use super::{moved_permanently, see_other, PageQuery, COMPANIES_PER_PAGE};
use crate::board::JobBoard;
use crate::catalog::{self, CategoryId, CompanyDraft, CompanyId, PageWindow};
use crate::error::AppError;
use crate::tenancy::Tenant;

pub(crate) async fn companies(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let total = board.db.count_companies_with_paid_jobs(tenant.id()).await?;
    let window = PageWindow::resolve(query.page.as_deref(), total, COMPANIES_PER_PAGE);
    let companies = board
        .db
        .companies_with_paid_jobs(tenant.id(), window.limit, window.offset)
        .await?;
    let items = companies.iter().map(CompanySummary::from).collect();
    Ok(Json(json!({
        "title": "Companies",
        "companies": window.page::<CompanySummary>(items, total),
    })))
}

pub(crate) async fn create_company(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Json(draft): Json<CompanyDraft>,
) -> Result<Response, AppError> {
    let company = catalog::create_company(&board.db, tenant.id(), user.id, draft).await?;
    let body = json!({
        "message": format!("{} has been successfully added", company.name),
        "company": CompanySummary::from(&company),
    });
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, company.path())],
        Json(body),
    )
        .into_response())
}

pub(crate) async fn company_redirect(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let company = board.db.get_company(tenant.id(), CompanyId(id)).await?;
    Ok(moved_permanently(company.path()))
}

pub(crate) async fn company(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Path((id, _slug)): Path<(i64, String)>,
) -> Result<Json<CompanyDetail>, AppError> {
    let company = board.db.get_company(tenant.id(), CompanyId(id)).await?;
    let jobs = board
        .db
        .paid_jobs_for_company(tenant.id(), company.id)
        .await?;
    Ok(Json(CompanyDetail {
        company: CompanySummary::from(&company),
        jobs: summaries(&jobs),
    }))
}

pub(crate) async fn update_company(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<i64>,
    Json(draft): Json<CompanyDraft>,
) -> Result<Response, AppError> {
    let company = board.db.get_company(tenant.id(), CompanyId(id)).await?;
    if company.user_id != user.id && !user.is_staff {
        return Ok(see_other(company.path(), None));
    }

    let company = catalog::update_company(&board.db, tenant.id(), company.id, draft).await?;
    let body = json!({
        "message": format!("{} has been successfully updated", company.name),
        "company": CompanySummary::from(&company),
    });
    Ok(Json(body).into_response())
}

pub(crate) async fn categories(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
) -> Result<Json<serde_json::Value>, AppError> {
    let categories = board.db.categories_with_active_jobs(tenant.id()).await?;
    let categories: Vec<CategorySummary> = categories.iter().map(CategorySummary::from).collect();
    Ok(Json(json!({
        "title": "Categories",
        "categories": categories,
    })))
}

pub(crate) async fn category_redirect(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let category = board.db.get_category(tenant.id(), CategoryId(id)).await?;
    Ok(moved_permanently(category.path()))
}

pub(crate) async fn category(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Path((id, _slug)): Path<(i64, String)>,
) -> Result<Json<CategoryDetail>, AppError> {
    category_detail(&board, &tenant, CategoryId(id)).await.map(Json)
}

async fn category_detail(
    board: &JobBoard,
    tenant: &Tenant,
    id: CategoryId,
) -> Result<CategoryDetail, AppError> {
    let category = board.db.get_category(tenant.id(), id).await?;
    let jobs = board
        .db
        .active_jobs_in_category(tenant.id(), category.id, None)
        .await?;
    Ok(CategoryDetail {
        feed_url: tenant.absolute_url(&category.feed_path()),
        category: CategorySummary::from(&category),
        jobs: summaries(&jobs),
    })
}

/// Countries are shared by every site.
pub(crate) async fn countries(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(_): CurrentTenant,
) -> Result<Json<serde_json::Value>, AppError> {
    let countries = board.db.list_countries().await?;
    Ok(Json(json!({ "countries": countries })))
}
