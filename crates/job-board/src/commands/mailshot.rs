use std::fmt::{self, Write as _};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::CommandError;
use crate::catalog::Job;
use crate::integrations::{CampaignDraft, MailingListProvider};
use crate::storage::Database;
use crate::tenancy::Tenant;

pub const MAILSHOT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailshotReport {
    pub site_name: String,
    pub sent: bool,
}

impl fmt::Display for MailshotReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] mailshot sent: {}", self.site_name, self.sent)
    }
}

/// Send each configured site's weekly digest of newly activated jobs.
pub async fn send_mailshots(
    db: &Database,
    provider: &dyn MailingListProvider,
    at: DateTime<Utc>,
) -> Result<Vec<MailshotReport>, CommandError> {
    let since = at - Duration::days(MAILSHOT_WINDOW_DAYS);
    let mut reports = Vec::new();

    for tenant in db.tenants().await? {
        let mut sent = false;

        if let Some((credentials, list_id)) = tenant.config.mailchimp_list() {
            let jobs = db.active_jobs_paid_since(tenant.id(), since).await?;
            if !jobs.is_empty() {
                let draft = mailshot_draft(&tenant, &list_id, &jobs);
                match provider.send_campaign(&credentials, &draft).await {
                    Ok(()) => sent = true,
                    Err(err) => {
                        warn!(site = %tenant.site.domain, error = %err, "mailshot failed")
                    }
                }
            }
        }

        info!(site = %tenant.site.domain, sent, "mailshot run finished");
        reports.push(MailshotReport {
            site_name: tenant.site.name.clone(),
            sent,
        });
    }

    Ok(reports)
}

/// Plain-text campaign listing `jobs`, which must already be ordered by
/// category name.
pub fn mailshot_draft(tenant: &Tenant, list_id: &str, jobs: &[Job]) -> CampaignDraft {
    CampaignDraft {
        list_id: list_id.to_string(),
        subject: format!(
            "[{}] *ALL* jobs posted in the last {MAILSHOT_WINDOW_DAYS} days",
            tenant.name().to_uppercase()
        ),
        from_name: format!("{} Weekly Mailer", tenant.name()),
        reply_to: tenant.config.admin_email.clone(),
        body: digest_body(tenant, jobs),
    }
}

fn digest_body(tenant: &Tenant, jobs: &[Job]) -> String {
    let mut body = format!(
        "Here are all of the jobs posted on {} in the last {MAILSHOT_WINDOW_DAYS} days.\n",
        tenant.name()
    );

    let mut current_category: Option<&str> = None;
    for job in jobs {
        if current_category != Some(job.category_name.as_str()) {
            current_category = Some(job.category_name.as_str());
            let _ = write!(
                body,
                "\n{}\n{}\n",
                job.category_name,
                "-".repeat(job.category_name.chars().count())
            );
        }
        let _ = writeln!(
            body,
            "* {} ({})\n  {}",
            job.headline(),
            job.format_country(),
            tenant.absolute_url(&job.path())
        );
    }

    let _ = write!(
        body,
        "\nBrowse every open position at {}\n",
        tenant.absolute_url("/jobs")
    );
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::UserId;
    use crate::catalog::{CategoryId, CompanyId, JobId};
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

    fn job(id: i64, title: &str, category: &str) -> Job {
        Job {
            id: JobId(id),
            site_id: SiteId(1),
            user_id: UserId(1),
            company_id: CompanyId(1),
            company_name: "Tramcar".to_string(),
            category_id: CategoryId(1),
            category_name: category.to_string(),
            country_id: None,
            country_name: None,
            title: title.to_string(),
            description: String::new(),
            application_info: String::new(),
            location: String::new(),
            city: String::new(),
            state: String::new(),
            email: "owner@tramcar.org".to_string(),
            remote: true,
            created_at: now(),
            paid_at: Some(now()),
            expired_at: None,
        }
    }

    #[test]
    fn draft_uses_site_branding() {
        let draft = mailshot_draft(&tenant(), "abc123", &[job(1, "Developer", "Software")]);
        assert_eq!(draft.subject, "[TRAMCAR] *ALL* jobs posted in the last 7 days");
        assert_eq!(draft.from_name, "Tramcar Weekly Mailer");
        assert_eq!(draft.reply_to, "admin@tramcar.org");
        assert_eq!(draft.list_id, "abc123");
    }

    #[test]
    fn body_groups_jobs_under_category_headings() {
        let jobs = [
            job(1, "Designer", "Design"),
            job(2, "Illustrator", "Design"),
            job(3, "Developer", "Software"),
        ];
        let body = digest_body(&tenant(), &jobs);
        assert_eq!(body.matches("\nDesign\n").count(), 1);
        assert_eq!(body.matches("\nSoftware\n").count(), 1);
        assert!(body.contains("* Illustrator @ Tramcar (Anywhere)"));
        assert!(body.contains("http://tramcar.org/jobs/3/developer"));
        let design = body.find("\nDesign\n").expect("design heading");
        let software = body.find("\nSoftware\n").expect("software heading");
        assert!(design < software);
    }

    #[test]
    fn report_line_names_the_site() {
        let report = MailshotReport {
            site_name: "Tramcar".to_string(),
            sent: false,
        };
        assert_eq!(report.to_string(), "[Tramcar] mailshot sent: false");
    }
}
