use std::sync::Arc;

use tracing::{info, warn};

use super::gateway::{ChargeReceipt, ChargeRequest, PaymentError, PaymentGateway};
use crate::accounts::{User, UserToken};
use crate::catalog::{Job, JobId};
use crate::lifecycle::{JobLifecycle, LifecycleError};
use crate::storage::{Database, DatabaseError};
use crate::tenancy::Tenant;

pub const CURRENCY: &str = "usd";

#[derive(Debug, thiserror::Error)]
pub enum ChargeError {
    #[error("job not found")]
    NotFound,
    #[error("this job has already been paid for")]
    AlreadyPaid,
    #[error("card payments are not enabled on this site")]
    Unavailable,
    #[error("You do not have any tokens available")]
    NoTokens,
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for ChargeError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound(_) => Self::NotFound,
            other => Self::Database(other),
        }
    }
}

/// Composes the payment gateway with the job lifecycle.
#[derive(Debug, Clone)]
pub struct Payments {
    db: Database,
    gateway: Arc<dyn PaymentGateway>,
    lifecycle: JobLifecycle,
}

impl Payments {
    pub fn new(db: Database, gateway: Arc<dyn PaymentGateway>, lifecycle: JobLifecycle) -> Self {
        Self {
            db,
            gateway,
            lifecycle,
        }
    }

    /// Charge the site's listing price to `card_token` and activate the job.
    pub async fn charge_card(
        &self,
        tenant: &Tenant,
        payer: &User,
        job_id: JobId,
        card_token: &str,
    ) -> Result<(Job, ChargeReceipt), ChargeError> {
        let mut job = self.owned_unpaid_job(tenant, payer, job_id).await?;
        let credentials = tenant
            .config
            .stripe_credentials()
            .ok_or(ChargeError::Unavailable)?;

        let request = ChargeRequest {
            amount_cents: tenant.config.price_in_cents(),
            currency: CURRENCY.to_string(),
            source: card_token.trim().to_string(),
            description: format!("{} job #{}", tenant.name(), job.id),
        };
        let receipt = self.gateway.charge(&credentials, &request).await?;
        info!(job_id = %job.id, charge_id = %receipt.id, amount = receipt.amount_cents, "card charged");

        if !self.lifecycle.activate(tenant, &mut job).await? {
            warn!(job_id = %job.id, charge_id = %receipt.id, "charged job was already active");
        }
        Ok((job, receipt))
    }

    /// Spend one of the payer's tokens to activate the job. Returns the
    /// remaining balance.
    pub async fn redeem_token(
        &self,
        tenant: &Tenant,
        payer: &User,
        job_id: JobId,
    ) -> Result<(Job, UserToken), ChargeError> {
        let mut job = self.owned_unpaid_job(tenant, payer, job_id).await?;

        if !self.db.deduct_user_token(payer.id).await? {
            return Err(ChargeError::NoTokens);
        }

        match self.lifecycle.activate(tenant, &mut job).await {
            Ok(true) => {}
            Ok(false) => {
                self.db.refund_user_token(payer.id).await?;
                return Err(ChargeError::AlreadyPaid);
            }
            Err(err) => {
                self.db.refund_user_token(payer.id).await?;
                return Err(err.into());
            }
        }

        let balance = self.db.user_tokens(payer.id).await?;
        info!(job_id = %job.id, user_id = %payer.id, remaining = balance.tokens, "token redeemed");
        Ok((job, balance))
    }

    async fn owned_unpaid_job(
        &self,
        tenant: &Tenant,
        payer: &User,
        job_id: JobId,
    ) -> Result<Job, ChargeError> {
        let job = self.db.get_job(tenant.id(), job_id).await?;
        if job.user_id != payer.id {
            return Err(ChargeError::NotFound);
        }
        if job.is_paid() {
            return Err(ChargeError::AlreadyPaid);
        }
        Ok(job)
    }
}
