use std::fmt::Debug;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use super::IntegrationError;
use crate::config::SmtpConfig;

/// Plain-text e-mail handed to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

impl OutboundEmail {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            reply_to: None,
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    fn to_message(&self) -> Result<Message, IntegrationError> {
        let mut builder = Message::builder()
            .from(parse_mailbox(&self.from)?)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(parse_mailbox(reply_to)?);
        }
        for recipient in &self.to {
            builder = builder.to(parse_mailbox(recipient)?);
        }
        builder
            .body(self.body.clone())
            .map_err(|err| IntegrationError::Invalid(format!("unable to build e-mail: {err}")))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, IntegrationError> {
    address
        .trim()
        .parse()
        .map_err(|err| IntegrationError::Invalid(format!("invalid address '{address}': {err}")))
}

#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, email: &OutboundEmail) -> Result<(), IntegrationError>;
}

/// Sends mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, IntegrationError> {
        let builder = if config.port == 25 {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|err| IntegrationError::transport("smtp", err))?
        };
        let mut builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
        })
    }
}

impl Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), IntegrationError> {
        let message = email.to_message()?;
        debug!(to = ?email.to, subject = %email.subject, "sending e-mail");
        self.transport
            .send(message)
            .await
            .map_err(|err| IntegrationError::transport("smtp", err))?;
        Ok(())
    }
}

/// Logs messages instead of delivering them. Used in debug mode and when no
/// relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), IntegrationError> {
        email.to_message()?;
        info!(
            from = %email.from,
            to = ?email.to,
            subject = %email.subject,
            body = %email.body,
            "e-mail not delivered (log mailer)"
        );
        Ok(())
    }
}

/// Fire-and-forget delivery: failures are logged, never returned.
pub async fn deliver_quietly(mailer: &dyn Mailer, email: &OutboundEmail) -> bool {
    match mailer.send(email).await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, subject = %email.subject, "e-mail delivery failed");
            false
        }
    }
}
