//! Tenant-scoped JSON routes. Every handler resolves the site from `Host`.

mod accounts;
mod catalog;
pub mod extract;
mod feed;
mod jobs;
mod site;
pub mod views;

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::board::JobBoard;

pub use extract::{CurrentTenant, CurrentUser, MaybeUser};

pub const JOBS_ON_FRONT_PAGE: i64 = 10;
pub const JOBS_PER_PAGE: u32 = 25;
pub const COMPANIES_PER_PAGE: u32 = 25;
pub const JOBS_PER_FEED: i64 = 30;

/// Router builder exposing the board's public and member endpoints.
pub fn board_router(board: Arc<JobBoard>) -> Router {
    Router::new()
        .route("/", get(jobs::index))
        .route("/jobs", get(jobs::index).post(jobs::create))
        .route("/jobs/mine", get(jobs::mine))
        .route("/jobs/:id", get(jobs::show_redirect).put(jobs::update))
        .route("/jobs/:id/activate", post(jobs::activate))
        .route("/jobs/:id/expire", post(jobs::expire))
        .route("/jobs/:id/:slug", get(jobs::show))
        .route(
            "/companies",
            get(catalog::companies).post(catalog::create_company),
        )
        .route(
            "/companies/:id",
            get(catalog::company_redirect).put(catalog::update_company),
        )
        .route("/companies/:id/:slug", get(catalog::company))
        .route("/categories", get(catalog::categories))
        .route("/categories/:id", get(catalog::category_redirect))
        .route("/categories/:id/:slug", get(catalog::category))
        .route("/categories/:id/:slug/feed", get(feed::category_feed))
        .route("/countries", get(catalog::countries))
        .route("/contact", post(site::contact))
        .route("/subscribe", post(site::subscribe))
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/charge_card", post(jobs::charge_card))
        .route("/charge_token", post(jobs::charge_token))
        .route(
            "/admin/site-config",
            get(site::show_config).put(site::update_config),
        )
        .with_state(board)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageQuery {
    pub(crate) page: Option<String>,
}

/// `301` to the canonical URL of a resource.
pub(crate) fn moved_permanently(path: String) -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, path)]).into_response()
}

/// `303` after a form-style action, optionally carrying a flash message.
pub(crate) fn see_other(path: String, message: Option<&str>) -> Response {
    let location = [(header::LOCATION, path)];
    match message {
        Some(message) => (
            StatusCode::SEE_OTHER,
            location,
            Json(json!({ "message": message })),
        )
            .into_response(),
        None => (StatusCode::SEE_OTHER, location).into_response(),
    }
}

