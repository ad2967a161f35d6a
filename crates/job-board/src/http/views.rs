//! JSON shapes returned by the board's routes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::accounts::User;
use crate::catalog::{Category, CategoryId, Company, CompanyId, CountryId, Job, JobId};
use crate::markdown;
use crate::tenancy::Tenant;

/// Owners and staff see unpaid jobs and contact details.
pub fn can_manage(viewer: Option<&User>, job: &Job) -> bool {
    viewer.is_some_and(|user| user.is_staff || user.id == job.user_id)
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub category: String,
    pub country: String,
    pub remote: bool,
    pub paid: bool,
    pub expired: bool,
    pub post_date: DateTime<Utc>,
    pub path: String,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            company: job.company_name.clone(),
            category: job.category_name.clone(),
            country: job.format_country().to_string(),
            remote: job.remote,
            paid: job.is_paid(),
            expired: job.is_expired(),
            post_date: job.post_date(),
            path: job.path(),
        }
    }
}

pub fn summaries(jobs: &[Job]) -> Vec<JobSummary> {
    jobs.iter().map(JobSummary::from).collect()
}

/// Listing price and the key the browser needs to tokenise a card.
#[derive(Debug, Clone, Serialize)]
pub struct Pricing {
    pub price: Decimal,
    pub price_in_cents: i64,
    pub stripe_publishable_key: String,
}

impl Pricing {
    pub fn for_tenant(tenant: &Tenant) -> Self {
        Self {
            price: tenant.config.price(),
            price_in_cents: tenant.config.price_in_cents(),
            stripe_publishable_key: tenant.config.stripe_publishable_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    pub id: JobId,
    pub title: String,
    pub headline: String,
    pub company_id: CompanyId,
    pub company: String,
    pub category_id: CategoryId,
    pub category: String,
    pub country_id: Option<CountryId>,
    pub country: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub remote: bool,
    pub description_html: String,
    pub application_info_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub paid: bool,
    pub expired: bool,
    pub post_date: DateTime<Utc>,
    pub path: String,
    pub pricing: Pricing,
}

impl JobDetail {
    pub fn new(tenant: &Tenant, job: &Job, viewer: Option<&User>) -> Self {
        let manager = can_manage(viewer, job);
        Self {
            id: job.id,
            title: job.title.clone(),
            headline: job.headline(),
            company_id: job.company_id,
            company: job.company_name.clone(),
            category_id: job.category_id,
            category: job.category_name.clone(),
            country_id: job.country_id,
            country: job.format_country().to_string(),
            location: job.location.clone(),
            city: job.city.clone(),
            state: job.state.clone(),
            remote: job.remote,
            description_html: markdown::render(&job.description),
            application_info_html: markdown::render(&job.application_info),
            email: manager.then(|| job.email.clone()),
            paid: job.is_paid(),
            expired: job.is_expired(),
            post_date: job.post_date(),
            path: job.path(),
            pricing: Pricing::for_tenant(tenant),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    pub url: String,
    pub twitter: Option<String>,
    pub country: Option<String>,
    pub path: String,
}

impl From<&Company> for CompanySummary {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            url: company.url.clone(),
            twitter: company.twitter.clone(),
            country: company.country_name.clone(),
            path: company.path(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: CompanySummary,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub path: String,
    pub feed_path: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            path: category.path(),
            feed_path: category.feed_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: CategorySummary,
    pub feed_url: String,
    pub jobs: Vec<JobSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::UserId;
    use crate::catalog::{CategoryId, CompanyId};
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

    fn job() -> Job {
        Job {
            id: JobId(7),
            site_id: SiteId(1),
            user_id: UserId(1),
            company_id: CompanyId(1),
            company_name: "Tramcar".to_string(),
            category_id: CategoryId(1),
            category_name: "Software Development".to_string(),
            country_id: None,
            country_name: None,
            title: "Software Developer".to_string(),
            description: "**Rust** <script>alert(1)</script>".to_string(),
            application_info: "Send resume".to_string(),
            location: String::new(),
            city: String::new(),
            state: String::new(),
            email: "owner@tramcar.org".to_string(),
            remote: true,
            created_at: now(),
            paid_at: None,
            expired_at: None,
        }
    }

    fn user(id: i64, is_staff: bool) -> User {
        User {
            id: UserId(id),
            username: format!("user{id}"),
            email: String::new(),
            password_hash: String::new(),
            is_staff,
            created_at: now(),
        }
    }

    #[test]
    fn contact_email_is_only_shown_to_managers() {
        let job = job();
        assert!(JobDetail::new(&tenant(), &job, None).email.is_none());
        assert!(JobDetail::new(&tenant(), &job, Some(&user(2, false))).email.is_none());
        assert_eq!(
            JobDetail::new(&tenant(), &job, Some(&user(1, false))).email.as_deref(),
            Some("owner@tramcar.org")
        );
        assert!(JobDetail::new(&tenant(), &job, Some(&user(3, true))).email.is_some());
    }

    #[test]
    fn descriptions_render_without_raw_html() {
        let detail = JobDetail::new(&tenant(), &job(), None);
        assert!(detail.description_html.contains("<strong>Rust</strong>"));
        assert!(!detail.description_html.contains("<script>"));
    }
}
