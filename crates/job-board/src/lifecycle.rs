//! Job activation and expiry.
//!
//! A job moves from unpaid to active when `paid_at` is stamped and from active
//! to expired when `expired_at` is stamped. Both stamps are written with
//! conditional updates so concurrent callers cannot apply a transition twice.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::Job;
use crate::integrations::{deliver_quietly, Mailer, OutboundEmail, SocialPublisher};
use crate::storage::{now, Database, DatabaseError};
use crate::tenancy::Tenant;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone)]
pub struct JobLifecycle {
    db: Database,
    mailer: Arc<dyn Mailer>,
    social: Arc<dyn SocialPublisher>,
    debug: bool,
}

impl JobLifecycle {
    pub fn new(
        db: Database,
        mailer: Arc<dyn Mailer>,
        social: Arc<dyn SocialPublisher>,
        debug: bool,
    ) -> Self {
        Self {
            db,
            mailer,
            social,
            debug,
        }
    }

    /// Mark an unpaid job as paid and announce it. Returns `false` without
    /// changing anything when the job was already paid.
    pub async fn activate(&self, tenant: &Tenant, job: &mut Job) -> Result<bool, LifecycleError> {
        if job.is_paid() {
            return Ok(false);
        }

        let paid_at = now();
        if !self.db.mark_job_paid(job.id, paid_at).await? {
            debug!(job_id = %job.id, "job was activated concurrently");
            return Ok(false);
        }
        job.paid_at = Some(paid_at);
        info!(site_id = %tenant.id(), job_id = %job.id, "job activated");

        self.announce(tenant, job).await;
        Ok(true)
    }

    /// Retire an active job and tell its poster. Returns `false` for unpaid or
    /// already expired jobs.
    pub async fn expire(&self, tenant: &Tenant, job: &mut Job) -> Result<bool, LifecycleError> {
        if !job.is_active() {
            return Ok(false);
        }

        let expired_at = now();
        if !self.db.mark_job_expired(job.id, expired_at).await? {
            debug!(job_id = %job.id, "job was expired concurrently");
            return Ok(false);
        }
        job.expired_at = Some(expired_at);
        info!(site_id = %tenant.id(), job_id = %job.id, "job expired");

        deliver_quietly(self.mailer.as_ref(), &expiry_email(tenant, job)).await;
        Ok(true)
    }

    async fn announce(&self, tenant: &Tenant, job: &Job) {
        let Some(credentials) = tenant.config.social_credentials() else {
            return;
        };
        let text = activation_post(tenant, job);
        if self.debug {
            debug!(%text, "debug mode: status update not posted");
            return;
        }
        if let Err(err) = self.social.post(&credentials, &text).await {
            warn!(error = %err, job_id = %job.id, "status update failed");
        }
    }
}

/// `"<title> @ <company> <absolute job url>"`
pub fn activation_post(tenant: &Tenant, job: &Job) -> String {
    format!("{} {}", job.headline(), tenant.absolute_url(&job.path()))
}

pub fn expiry_email(tenant: &Tenant, job: &Job) -> OutboundEmail {
    let body = format!(
        "Hello,\n\n\
         Your job posting \"{title}\" for {company} has expired and is no longer \
         listed on {site}.\n\n\
         You can still view it at {url}\n\n\
         Thanks,\n{site}\n",
        title = job.title,
        company = job.company_name,
        site = tenant.name(),
        url = tenant.absolute_url(&job.path()),
    );
    OutboundEmail::new(
        tenant.config.admin_email.clone(),
        job.email.clone(),
        format!("Your {} job has expired", tenant.name()),
        body,
    )
}
