//! Composition root shared by the HTTP surface and operator commands.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::accounts::{Accounts, SessionKeys};
use crate::catalog::{validate_email, Job};
use crate::config::AppConfig;
use crate::integrations::{
    deliver_quietly, IntegrationError, LogMailer, MailchimpClient, Mailer, MailingListProvider,
    OutboundEmail, SmtpMailer, SocialPublisher, TwitterPublisher,
};
use crate::lifecycle::JobLifecycle;
use crate::payments::{PaymentGateway, Payments, StripeGateway};
use crate::storage::Database;
use crate::tenancy::Tenant;

/// Outbound adapters; tests substitute recording fakes.
#[derive(Debug, Clone)]
pub struct Integrations {
    pub mailer: Arc<dyn Mailer>,
    pub social: Arc<dyn SocialPublisher>,
    pub payments: Arc<dyn PaymentGateway>,
    pub mailing_lists: Arc<dyn MailingListProvider>,
}

impl Integrations {
    /// Live adapters. Mail is only relayed over SMTP in production with a
    /// configured relay; otherwise it is logged.
    pub fn from_config(config: &AppConfig) -> Result<Self, IntegrationError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("job-board/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|err| IntegrationError::transport("http client", err))?;

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) if !config.environment.is_debug() => Arc::new(SmtpMailer::new(smtp)?),
            _ => Arc::new(LogMailer),
        };

        Ok(Self {
            mailer,
            social: Arc::new(TwitterPublisher::new(client.clone())),
            payments: Arc::new(StripeGateway::new(client.clone())),
            mailing_lists: Arc::new(MailchimpClient::new(client)),
        })
    }
}

/// Contact form payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Feedback {
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl Feedback {
    pub fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        if self.subject.trim().is_empty() {
            return Err("subject is required".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("message is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct JobBoard {
    pub db: Database,
    pub accounts: Accounts,
    pub lifecycle: JobLifecycle,
    pub payments: Payments,
    pub integrations: Integrations,
    debug: bool,
}

impl JobBoard {
    pub fn new(db: Database, keys: SessionKeys, integrations: Integrations, debug: bool) -> Self {
        let lifecycle = JobLifecycle::new(
            db.clone(),
            integrations.mailer.clone(),
            integrations.social.clone(),
            debug,
        );
        let payments = Payments::new(db.clone(), integrations.payments.clone(), lifecycle.clone());
        let accounts = Accounts::new(db.clone(), keys);

        Self {
            db,
            accounts,
            lifecycle,
            payments,
            integrations,
            debug,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Tell the site admin a job is waiting for payment or review.
    pub async fn notify_new_job(&self, tenant: &Tenant, job: &Job) {
        let admin = tenant.config.admin_email.clone();
        let body = format!(
            "A new job has been posted on {site}.\n\n\
             Title: {title}\nCompany: {company}\nCategory: {category}\nContact: {email}\n\n\
             {url}\n",
            site = tenant.name(),
            title = job.title,
            company = job.company_name,
            category = job.category_name,
            email = job.email,
            url = tenant.absolute_url(&job.path()),
        );
        let email = OutboundEmail::new(
            admin.clone(),
            admin,
            format!("[{}] New job posting", tenant.name().to_uppercase()),
            body,
        );
        deliver_quietly(self.integrations.mailer.as_ref(), &email).await;
    }

    /// Forward a visitor's message to the site admin.
    pub async fn send_feedback(&self, tenant: &Tenant, feedback: &Feedback) -> bool {
        let admin = tenant.config.admin_email.clone();
        let email = OutboundEmail::new(
            admin.clone(),
            admin,
            format!(
                "[{}] Feedback: {}",
                tenant.name().to_uppercase(),
                feedback.subject.trim()
            ),
            format!("From: {}\n\n{}\n", feedback.email.trim(), feedback.message),
        )
        .with_reply_to(feedback.email.trim().to_string());
        deliver_quietly(self.integrations.mailer.as_ref(), &email).await
    }

    /// Add `email` to the site's list as a pending subscriber. Returns `false`
    /// when the site has no mailing list configured.
    pub async fn subscribe(&self, tenant: &Tenant, email: &str) -> Result<bool, IntegrationError> {
        let Some((credentials, list_id)) = tenant.config.mailchimp_list() else {
            return Ok(false);
        };
        self.integrations
            .mailing_lists
            .subscribe(&credentials, &list_id, email.trim())
            .await
            .map_err(|err| {
                warn!(site = %tenant.site.domain, error = %err, "subscription failed");
                err
            })?;
        info!(site = %tenant.site.domain, "subscription pending confirmation");
        Ok(true)
    }
}
