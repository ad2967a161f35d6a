//! Outbound integrations: SMTP mail, social posting and mailing lists.
//!
//! Every integration sits behind an `async_trait` so the board can swap in
//! recording fakes under test.

pub mod mailer;
pub mod mailing_list;
pub mod social;

pub use mailer::{deliver_quietly, LogMailer, Mailer, OutboundEmail, SmtpMailer};
pub use mailing_list::{
    CampaignDraft, MailchimpClient, MailchimpCredentials, MailingList, MailingListProvider,
};
pub use social::{SocialCredentials, SocialPublisher, TwitterPublisher};

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    #[error("{service} rejected the request ({status}): {message}")]
    Rejected {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("{0}")]
    Invalid(String),
}

impl IntegrationError {
    pub(crate) fn transport(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            service,
            message: err.to_string(),
        }
    }
}

/// Turn a non-success response into `IntegrationError::Rejected`, keeping the body as the message.
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IntegrationError::Rejected {
        service,
        status: status.as_u16(),
        message: body,
    })
}
