use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use super::CommandError;
use crate::lifecycle::JobLifecycle;
use crate::storage::Database;

/// Per-site outcome of a batch expiry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpireReport {
    pub site_name: String,
    pub expired: usize,
}

impl fmt::Display for ExpireReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} jobs expired", self.site_name, self.expired)
    }
}

/// Expire every job paid more than the site's `expire_after` days before `at`.
pub async fn expire_jobs(
    db: &Database,
    lifecycle: &JobLifecycle,
    at: DateTime<Utc>,
) -> Result<Vec<ExpireReport>, CommandError> {
    let mut reports = Vec::new();

    for tenant in db.tenants().await? {
        let mut expired = 0;

        match cutoff(at, tenant.config.expire_after) {
            Some(cutoff) => {
                for mut job in db.expirable_jobs(tenant.id(), cutoff).await? {
                    if lifecycle.expire(&tenant, &mut job).await? {
                        expired += 1;
                    }
                }
            }
            None => warn!(
                site = %tenant.site.domain,
                expire_after = tenant.config.expire_after,
                "expire_after window out of range, skipping site"
            ),
        }

        info!(site = %tenant.site.domain, expired, "expire run finished");
        reports.push(ExpireReport {
            site_name: tenant.site.name.clone(),
            expired,
        });
    }

    Ok(reports)
}

/// `at` minus `days`, or `None` when the window cannot be represented.
fn cutoff(at: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(days).and_then(|window| at.checked_sub_signed(window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_windows_have_no_cutoff() {
        let at = Utc::now();
        assert_eq!(cutoff(at, 30), Some(at - TimeDelta::days(30)));
        assert_eq!(cutoff(at, 1_000_000_000), None);
        assert_eq!(cutoff(at, i64::MAX), None);
    }

    #[test]
    fn report_line_names_the_site() {
        let report = ExpireReport {
            site_name: "Tramcar".to_string(),
            expired: 2,
        };
        assert_eq!(report.to_string(), "[Tramcar] 2 jobs expired");
    }
}
