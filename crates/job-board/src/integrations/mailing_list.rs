use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{check_status, IntegrationError};

const SERVICE: &str = "mailchimp";

#[derive(Clone, PartialEq, Eq)]
pub struct MailchimpCredentials {
    pub username: String,
    pub api_key: String,
}

impl MailchimpCredentials {
    /// Mailchimp keys end in `-<dc>`; the suffix names the API host.
    pub fn data_center(&self) -> Option<&str> {
        self.api_key
            .rsplit_once('-')
            .map(|(_, dc)| dc.trim())
            .filter(|dc| !dc.is_empty())
    }
}

impl Debug for MailchimpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailchimpCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingList {
    pub id: String,
    pub name: String,
}

/// A plain-text campaign ready to be created and sent to a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignDraft {
    pub list_id: String,
    pub subject: String,
    pub from_name: String,
    pub reply_to: String,
    pub body: String,
}

#[async_trait]
pub trait MailingListProvider: Send + Sync + Debug {
    async fn lists(
        &self,
        credentials: &MailchimpCredentials,
    ) -> Result<Vec<MailingList>, IntegrationError>;

    /// Adds `email` as a pending member; the provider sends the opt-in mail.
    async fn subscribe(
        &self,
        credentials: &MailchimpCredentials,
        list_id: &str,
        email: &str,
    ) -> Result<(), IntegrationError>;

    async fn send_campaign(
        &self,
        credentials: &MailchimpCredentials,
        draft: &CampaignDraft,
    ) -> Result<(), IntegrationError>;
}

/// Mailchimp Marketing API v3 client.
#[derive(Debug, Clone)]
pub struct MailchimpClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

#[derive(Deserialize)]
struct ListsResponse {
    #[serde(default)]
    lists: Vec<MailingList>,
}

#[derive(Deserialize)]
struct CampaignCreated {
    id: String,
}

impl MailchimpClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Pin every request to `base_url` instead of the key's data centre.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: Some(base_url.into().trim_end_matches('/').to_string()),
        }
    }

    fn endpoint(
        &self,
        credentials: &MailchimpCredentials,
        path: &str,
    ) -> Result<String, IntegrationError> {
        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => {
                let dc = credentials.data_center().ok_or_else(|| {
                    IntegrationError::Invalid(
                        "mailchimp api key does not name a data centre".to_string(),
                    )
                })?;
                format!("https://{dc}.api.mailchimp.com/3.0")
            }
        };
        Ok(format!("{base}{path}"))
    }

    async fn call(
        &self,
        credentials: &MailchimpCredentials,
        method: reqwest::Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, IntegrationError> {
        let url = self.endpoint(credentials, path)?;
        debug!(%method, %url, "calling mailchimp");
        let mut request = self
            .client
            .request(method, url)
            .basic_auth(&credentials.username, Some(&credentials.api_key));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request
            .send()
            .await
            .map_err(|err| IntegrationError::transport(SERVICE, err))?;
        check_status(SERVICE, response).await
    }
}

#[async_trait]
impl MailingListProvider for MailchimpClient {
    async fn lists(
        &self,
        credentials: &MailchimpCredentials,
    ) -> Result<Vec<MailingList>, IntegrationError> {
        let response = self
            .call(credentials, reqwest::Method::GET, "/lists?count=100", None)
            .await?;
        let lists: ListsResponse = response
            .json()
            .await
            .map_err(|err| IntegrationError::transport(SERVICE, err))?;
        Ok(lists.lists)
    }

    async fn subscribe(
        &self,
        credentials: &MailchimpCredentials,
        list_id: &str,
        email: &str,
    ) -> Result<(), IntegrationError> {
        self.call(
            credentials,
            reqwest::Method::POST,
            &format!("/lists/{list_id}/members"),
            Some(json!({ "email_address": email, "status": "pending" })),
        )
        .await?;
        Ok(())
    }

    async fn send_campaign(
        &self,
        credentials: &MailchimpCredentials,
        draft: &CampaignDraft,
    ) -> Result<(), IntegrationError> {
        let created: CampaignCreated = self
            .call(
                credentials,
                reqwest::Method::POST,
                "/campaigns",
                Some(json!({
                    "type": "plaintext",
                    "recipients": { "list_id": draft.list_id },
                    "settings": {
                        "subject_line": draft.subject,
                        "reply_to": draft.reply_to,
                        "from_name": draft.from_name,
                    },
                })),
            )
            .await?
            .json()
            .await
            .map_err(|err| IntegrationError::transport(SERVICE, err))?;

        self.call(
            credentials,
            reqwest::Method::PUT,
            &format!("/campaigns/{}/content", created.id),
            Some(json!({ "plain_text": draft.body })),
        )
        .await?;

        self.call(
            credentials,
            reqwest::Method::POST,
            &format!("/campaigns/{}/actions/send", created.id),
            None,
        )
        .await?;
        Ok(())
    }
}
