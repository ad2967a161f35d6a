//! RSS 2.0 feed of a category's latest active jobs.

use std::fmt::Write as _;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use super::extract::CurrentTenant;
use super::JOBS_PER_FEED;
use crate::board::JobBoard;
use crate::catalog::{Category, CategoryId, Job};
use crate::error::AppError;
use crate::markdown;
use crate::tenancy::Tenant;

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

pub(crate) async fn category_feed(
    State(board): State<Arc<JobBoard>>,
    CurrentTenant(tenant): CurrentTenant,
    Path((id, _slug)): Path<(i64, String)>,
) -> Result<Response, AppError> {
    let category = board.db.get_category(tenant.id(), CategoryId(id)).await?;
    let jobs = board
        .db
        .active_jobs_in_category(tenant.id(), category.id, Some(JOBS_PER_FEED))
        .await?;
    let body = render(&tenant, &category, &jobs);
    Ok(([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], body).into_response())
}

pub(crate) fn render(tenant: &Tenant, category: &Category, jobs: &[Job]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str("<rss version=\"2.0\"><channel>");
    push_element(
        &mut xml,
        "title",
        &format!("{} - {} Jobs Feed", tenant.name(), category.name),
    );
    push_element(&mut xml, "link", &tenant.absolute_url(&category.path()));
    push_element(
        &mut xml,
        "description",
        &format!("The latest {} jobs on {}", category.name, tenant.name()),
    );
    if let Some(latest) = jobs.first() {
        push_element(&mut xml, "lastBuildDate", &latest.post_date().to_rfc2822());
    }

    for job in jobs {
        let link = tenant.absolute_url(&job.path());
        xml.push_str("<item>");
        push_element(&mut xml, "title", &job.headline());
        push_element(&mut xml, "link", &link);
        push_element(&mut xml, "description", &markdown::render(&job.description));
        push_element(&mut xml, "pubDate", &job.post_date().to_rfc2822());
        push_element(&mut xml, "guid", &link);
        xml.push_str("</item>");
    }

    xml.push_str("</channel></rss>\n");
    xml
}

fn push_element(xml: &mut String, name: &str, text: &str) {
    let _ = write!(xml, "<{name}>{}</{name}>", escape(text));
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::UserId;
    use crate::catalog::{CompanyId, JobId};
    use crate::storage::now;
    use crate::tenancy::{Site, SiteConfig, SiteId};

    fn tenant() -> Tenant {
        let site = Site {
            id: SiteId(1),
            domain: "tramcar.org".to_string(),
            name: "Tramcar".to_string(),
        };
        let config = SiteConfig::defaults_for(&site);
        Tenant { site, config }
    }

    fn category() -> Category {
        Category {
            id: CategoryId(3),
            site_id: SiteId(1),
            name: "Software Development".to_string(),
        }
    }

    fn job() -> Job {
        Job {
            id: JobId(9),
            site_id: SiteId(1),
            user_id: UserId(1),
            company_id: CompanyId(1),
            company_name: "Smith & Sons".to_string(),
            category_id: CategoryId(3),
            category_name: "Software Development".to_string(),
            country_id: None,
            country_name: None,
            title: "Rust Developer".to_string(),
            description: "*Remote* position".to_string(),
            application_info: "Apply online".to_string(),
            location: String::new(),
            city: String::new(),
            state: String::new(),
            email: "jobs@smith.example".to_string(),
            remote: true,
            created_at: now(),
            paid_at: Some(now()),
            expired_at: None,
        }
    }

    #[test]
    fn feed_lists_jobs_with_escaped_markup() {
        let xml = render(&tenant(), &category(), &[job()]);
        assert!(xml.contains("<title>Tramcar - Software Development Jobs Feed</title>"));
        assert!(xml.contains(
            "<link>http://tramcar.org/categories/3/software-development</link>"
        ));
        assert!(xml.contains("<title>Rust Developer @ Smith &amp; Sons</title>"));
        assert!(xml.contains("&lt;em&gt;Remote&lt;/em&gt;"));
        assert!(xml.contains("<guid>http://tramcar.org/jobs/9/rust-developer</guid>"));
    }

    #[test]
    fn empty_feeds_are_still_valid_channels() {
        let xml = render(&tenant(), &category(), &[]);
        assert!(xml.ends_with("</channel></rss>\n"));
        assert!(!xml.contains("<item>"));
        assert!(!xml.contains("lastBuildDate"));
    }
}
