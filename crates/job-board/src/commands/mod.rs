//! Operator commands run out-of-band from the HTTP server.

pub mod countries;
pub mod expire;
pub mod lists;
pub mod mailshot;

pub use countries::{import_countries, ImportSummary};
pub use expire::{expire_jobs, ExpireReport};
pub use lists::{display_lists, ListsOutput};
pub use mailshot::{mailshot_draft, send_mailshots, MailshotReport, MAILSHOT_WINDOW_DAYS};

use crate::integrations::IntegrationError;
use crate::lifecycle::LifecycleError;
use crate::storage::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Site with domain name {0} does not exist")]
    UnknownSite(String),
    #[error(
        "A MailChimp username and or api_key have not been configured on the site with domain name {0}"
    )]
    MissingCredentials(String),
    #[error("There was a problem connecting to the MailChimp API, check your credentials and try again")]
    MailingList(#[source] IntegrationError),
    #[error("invalid country file: {0}")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}
