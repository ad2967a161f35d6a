use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::integrations::mailing_list::MailchimpCredentials;
use crate::integrations::social::SocialCredentials;
use crate::payments::gateway::StripeCredentials;

/// Identifier wrapper for tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct SiteId(pub i64);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One independently configured job board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Site {
    pub id: SiteId,
    pub domain: String,
    pub name: String,
}

/// Scheme used when building absolute links for e-mails, tweets and feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(format!("unsupported protocol '{other}', expected http or https")),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational settings for a site. Created alongside the site itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteConfig {
    pub site_id: SiteId,
    /// Days a paid job stays listed before the expire command retires it.
    pub expire_after: i64,
    pub admin_email: String,
    /// Remote-only board: every job is forced to `remote = true`.
    pub remote: bool,
    pub protocol: Protocol,
    pub price_in_cents: i64,
    pub google_analytics: String,
    pub twitter: String,
    pub stripe_publishable_key: String,
    #[serde(skip_serializing)]
    pub stripe_secret_key: String,
    #[serde(skip_serializing)]
    pub twitter_access_token: String,
    pub mailchimp_username: String,
    #[serde(skip_serializing)]
    pub mailchimp_api_key: String,
    pub mailchimp_list_id: String,
}

pub const DEFAULT_EXPIRE_AFTER_DAYS: i64 = 30;
/// Upper bound for `expire_after`, matching a 16-bit column.
pub const MAX_EXPIRE_AFTER_DAYS: i64 = i16::MAX as i64;

impl SiteConfig {
    pub fn defaults_for(site: &Site) -> Self {
        Self {
            site_id: site.id,
            expire_after: DEFAULT_EXPIRE_AFTER_DAYS,
            admin_email: format!("admin@{}", site.domain),
            remote: false,
            protocol: Protocol::Http,
            price_in_cents: 0,
            google_analytics: String::new(),
            twitter: String::new(),
            stripe_publishable_key: String::new(),
            stripe_secret_key: String::new(),
            twitter_access_token: String::new(),
            mailchimp_username: String::new(),
            mailchimp_api_key: String::new(),
            mailchimp_list_id: String::new(),
        }
    }

    /// Listing price as a two-place decimal amount.
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_in_cents, 2)
    }

    pub fn price_in_cents(&self) -> i64 {
        self.price_in_cents
    }

    pub fn stripe_credentials(&self) -> Option<StripeCredentials> {
        if self.stripe_secret_key.trim().is_empty() {
            return None;
        }
        Some(StripeCredentials {
            publishable_key: self.stripe_publishable_key.clone(),
            secret_key: self.stripe_secret_key.clone(),
        })
    }

    pub fn social_credentials(&self) -> Option<SocialCredentials> {
        if self.twitter_access_token.trim().is_empty() {
            return None;
        }
        Some(SocialCredentials {
            access_token: self.twitter_access_token.clone(),
        })
    }

    pub fn mailchimp_credentials(&self) -> Option<MailchimpCredentials> {
        if self.mailchimp_username.trim().is_empty() || self.mailchimp_api_key.trim().is_empty() {
            return None;
        }
        Some(MailchimpCredentials {
            username: self.mailchimp_username.clone(),
            api_key: self.mailchimp_api_key.clone(),
        })
    }

    /// Credentials plus target list; mailshots and subscriptions need both.
    pub fn mailchimp_list(&self) -> Option<(MailchimpCredentials, String)> {
        let credentials = self.mailchimp_credentials()?;
        let list_id = self.mailchimp_list_id.trim();
        if list_id.is_empty() {
            return None;
        }
        Some((credentials, list_id.to_string()))
    }
}

/// Partial update applied by operators; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfigUpdate {
    pub expire_after: Option<i64>,
    pub admin_email: Option<String>,
    pub remote: Option<bool>,
    pub protocol: Option<Protocol>,
    pub price: Option<Decimal>,
    pub google_analytics: Option<String>,
    pub twitter: Option<String>,
    pub stripe_publishable_key: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub twitter_access_token: Option<String>,
    pub mailchimp_username: Option<String>,
    pub mailchimp_api_key: Option<String>,
    pub mailchimp_list_id: Option<String>,
}

impl SiteConfigUpdate {
    pub fn apply(self, config: &mut SiteConfig) -> Result<(), String> {
        if let Some(days) = self.expire_after {
            if !(0..=MAX_EXPIRE_AFTER_DAYS).contains(&days) {
                return Err(format!(
                    "expire_after must be between 0 and {MAX_EXPIRE_AFTER_DAYS} days"
                ));
            }
            config.expire_after = days;
        }
        if let Some(email) = self.admin_email {
            if !email.contains('@') {
                return Err(format!("'{email}' is not a valid e-mail address"));
            }
            config.admin_email = email;
        }
        if let Some(remote) = self.remote {
            config.remote = remote;
        }
        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(price) = self.price {
            config.price_in_cents = price_to_cents(price)?;
        }

        let strings = [
            (self.google_analytics, &mut config.google_analytics),
            (self.twitter, &mut config.twitter),
            (self.stripe_publishable_key, &mut config.stripe_publishable_key),
            (self.stripe_secret_key, &mut config.stripe_secret_key),
            (self.twitter_access_token, &mut config.twitter_access_token),
            (self.mailchimp_username, &mut config.mailchimp_username),
            (self.mailchimp_api_key, &mut config.mailchimp_api_key),
            (self.mailchimp_list_id, &mut config.mailchimp_list_id),
        ];
        for (value, slot) in strings {
            if let Some(value) = value {
                *slot = value.trim().to_string();
            }
        }
        Ok(())
    }
}

/// Converts a decimal price to whole cents, rejecting fractions of a cent.
pub fn price_to_cents(price: Decimal) -> Result<i64, String> {
    if price.is_sign_negative() {
        return Err("price must not be negative".to_string());
    }
    let cents = price * Decimal::ONE_HUNDRED;
    if !cents.fract().is_zero() {
        return Err(format!("price {price} has more than two decimal places"));
    }
    i64::try_from(cents).map_err(|_| format!("price {price} is out of range"))
}

/// The site resolved for a request together with its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub site: Site,
    pub config: SiteConfig,
}

impl Tenant {
    pub fn id(&self) -> SiteId {
        self.site.id
    }

    pub fn name(&self) -> &str {
        &self.site.name
    }

    /// Absolute link for `path` using the configured protocol.
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}://{}{}",
            self.config.protocol.as_str(),
            self.site.domain,
            path
        )
    }
}
