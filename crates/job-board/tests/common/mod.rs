#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use job_board::accounts::{Registration, SessionKeys, User};
use job_board::catalog::{self, Category, Company, CompanyDraft, Job, JobDraft};
use job_board::integrations::{
    CampaignDraft, IntegrationError, MailchimpCredentials, Mailer, MailingList,
    MailingListProvider, OutboundEmail, SocialCredentials, SocialPublisher,
};
use job_board::payments::{
    ChargeReceipt, ChargeRequest, PaymentError, PaymentGateway, StripeCredentials,
};
use job_board::storage::Database;
use job_board::tenancy::{configure_site, SiteConfigUpdate, Tenant};
use job_board::{Integrations, JobBoard};

pub const PASSWORD: &str = "correct horse";

#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|email| email.subject.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), IntegrationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingSocial {
    pub posts: Mutex<Vec<String>>,
}

#[async_trait]
impl SocialPublisher for RecordingSocial {
    async fn post(&self, _: &SocialCredentials, text: &str) -> Result<(), IntegrationError> {
        self.posts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub enum GatewayBehaviour {
    #[default]
    Approve,
    Decline(String),
    Unreachable,
}

#[derive(Debug, Default)]
pub struct FakeGateway {
    pub behaviour: Mutex<GatewayBehaviour>,
    pub charges: Mutex<Vec<ChargeRequest>>,
}

impl FakeGateway {
    pub fn set(&self, behaviour: GatewayBehaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn charge_count(&self) -> usize {
        self.charges.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn charge(
        &self,
        _: &StripeCredentials,
        request: &ChargeRequest,
    ) -> Result<ChargeReceipt, PaymentError> {
        let behaviour = self.behaviour.lock().unwrap().clone();
        match behaviour {
            GatewayBehaviour::Approve => {
                let mut charges = self.charges.lock().unwrap();
                charges.push(request.clone());
                Ok(ChargeReceipt {
                    id: format!("ch_{}", charges.len()),
                    amount_cents: request.amount_cents,
                })
            }
            GatewayBehaviour::Decline(message) => Err(PaymentError::Card(message)),
            GatewayBehaviour::Unreachable => {
                Err(PaymentError::Transport("connection refused".to_string()))
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeMailingList {
    pub lists: Vec<MailingList>,
    pub fail: bool,
    pub subscribers: Mutex<Vec<(String, String)>>,
    pub campaigns: Mutex<Vec<CampaignDraft>>,
}

impl FakeMailingList {
    fn unavailable(&self) -> Result<(), IntegrationError> {
        if self.fail {
            return Err(IntegrationError::Rejected {
                service: "mailchimp",
                status: 401,
                message: "API key invalid".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MailingListProvider for FakeMailingList {
    async fn lists(&self, _: &MailchimpCredentials) -> Result<Vec<MailingList>, IntegrationError> {
        self.unavailable()?;
        Ok(self.lists.clone())
    }

    async fn subscribe(
        &self,
        _: &MailchimpCredentials,
        list_id: &str,
        email: &str,
    ) -> Result<(), IntegrationError> {
        self.unavailable()?;
        self.subscribers
            .lock()
            .unwrap()
            .push((list_id.to_string(), email.to_string()));
        Ok(())
    }

    async fn send_campaign(
        &self,
        _: &MailchimpCredentials,
        draft: &CampaignDraft,
    ) -> Result<(), IntegrationError> {
        self.unavailable()?;
        self.campaigns.lock().unwrap().push(draft.clone());
        Ok(())
    }
}

/// A board serving `tramcar.org` with recording integrations.
pub struct Fixture {
    pub board: Arc<JobBoard>,
    pub tenant: Tenant,
    pub mailer: Arc<RecordingMailer>,
    pub social: Arc<RecordingSocial>,
    pub gateway: Arc<FakeGateway>,
    pub lists: Arc<FakeMailingList>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::build(false, FakeMailingList::default()).await
    }

    pub async fn debug() -> Self {
        Self::build(true, FakeMailingList::default()).await
    }

    pub async fn with_mailing_list(lists: FakeMailingList) -> Self {
        Self::build(false, lists).await
    }

    async fn build(debug: bool, lists: FakeMailingList) -> Self {
        let db = Database::open_in_memory().await.expect("database opens");
        let tenant = db
            .create_site("tramcar.org", "Tramcar")
            .await
            .expect("site created");

        let mailer = Arc::new(RecordingMailer::default());
        let social = Arc::new(RecordingSocial::default());
        let gateway = Arc::new(FakeGateway::default());
        let lists = Arc::new(lists);
        let integrations = Integrations {
            mailer: mailer.clone(),
            social: social.clone(),
            payments: gateway.clone(),
            mailing_lists: lists.clone(),
        };
        let board = JobBoard::new(
            db,
            SessionKeys::new(b"integration-secret", 3600),
            integrations,
            debug,
        );

        Self {
            board: Arc::new(board),
            tenant,
            mailer,
            social,
            gateway,
            lists,
        }
    }

    pub fn db(&self) -> &Database {
        &self.board.db
    }

    pub async fn configure(&mut self, update: SiteConfigUpdate) {
        configure_site(self.db(), self.tenant.id(), update)
            .await
            .expect("site configured");
        self.tenant = self
            .db()
            .tenant(self.tenant.site.clone())
            .await
            .expect("tenant reloads");
    }

    /// Registers and logs in a user, returning it with a bearer token.
    pub async fn user(&self, username: &str, staff: bool) -> (User, String) {
        let user = self
            .board
            .accounts
            .register(Registration {
                username: username.to_string(),
                email: format!("{username}@tramcar.org"),
                password1: PASSWORD.to_string(),
                password2: PASSWORD.to_string(),
            })
            .await
            .expect("user registers");
        let user = if staff {
            self.db().set_staff(user.id, true).await.expect("staff set")
        } else {
            user
        };
        let session = self
            .board
            .accounts
            .login(username, PASSWORD)
            .await
            .expect("user logs in");
        (user, session.token)
    }

    pub async fn company(&self, owner: &User, name: &str) -> Company {
        catalog::create_company(
            self.db(),
            self.tenant.id(),
            owner.id,
            CompanyDraft {
                name: name.to_string(),
                url: "https://tramcar.org".to_string(),
                twitter: None,
                country_id: None,
            },
        )
        .await
        .expect("company created")
    }

    pub async fn category(&self, name: &str) -> Category {
        catalog::add_category(self.db(), self.tenant.id(), name)
            .await
            .expect("category created")
    }

    pub async fn job(&self, owner: &User, company: &Company, category: &Category, title: &str) -> Job {
        catalog::create_job(self.db(), &self.tenant, owner.id, draft(company, category, title))
            .await
            .expect("job created")
    }

    /// An active job paid `days_ago` days before now.
    pub async fn paid_job(
        &self,
        owner: &User,
        company: &Company,
        category: &Category,
        title: &str,
        days_ago: i64,
    ) -> Job {
        let job = self.job(owner, company, category, title).await;
        let paid_at = chrono::Utc::now() - chrono::Duration::days(days_ago);
        assert!(self.db().mark_job_paid(job.id, paid_at).await.expect("paid"));
        self.db()
            .get_job(self.tenant.id(), job.id)
            .await
            .expect("job reloads")
    }
}

pub fn draft(company: &Company, category: &Category, title: &str) -> JobDraft {
    JobDraft {
        company_id: company.id,
        category_id: category.id,
        country_id: None,
        title: title.to_string(),
        description: "We are looking for someone **great**.".to_string(),
        application_info: "Send your resume to jobs@tramcar.org".to_string(),
        location: String::new(),
        city: String::new(),
        state: String::new(),
        email: "owner@tramcar.org".to_string(),
        remote: false,
    }
}
