use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{check_status, IntegrationError};

const TWITTER_API: &str = "https://api.twitter.com";

/// User-context access token allowed to post on the site's behalf.
#[derive(Clone, PartialEq, Eq)]
pub struct SocialCredentials {
    pub access_token: String,
}

impl Debug for SocialCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialCredentials").finish_non_exhaustive()
    }
}

#[async_trait]
pub trait SocialPublisher: Send + Sync + Debug {
    async fn post(&self, credentials: &SocialCredentials, text: &str) -> Result<(), IntegrationError>;
}

#[derive(Debug, Clone)]
pub struct TwitterPublisher {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct TweetBody<'a> {
    text: &'a str,
}

impl TwitterPublisher {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, TWITTER_API)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SocialPublisher for TwitterPublisher {
    async fn post(&self, credentials: &SocialCredentials, text: &str) -> Result<(), IntegrationError> {
        debug!(%text, "posting status update");
        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .bearer_auth(&credentials.access_token)
            .json(&TweetBody { text })
            .send()
            .await
            .map_err(|err| IntegrationError::transport("twitter", err))?;
        check_status("twitter", response).await?;
        Ok(())
    }
}
