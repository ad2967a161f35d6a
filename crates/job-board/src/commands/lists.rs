use std::fmt;

use super::CommandError;
use crate::integrations::{MailingList, MailingListProvider};
use crate::storage::Database;

/// Result of querying a site's mailing lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListsOutput {
    Lists(Vec<MailingList>),
    Empty { domain: String },
}

impl fmt::Display for ListsOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListsOutput::Lists(lists) => {
                writeln!(f, "The following MailChimp lists exist:")?;
                writeln!(f, "ID\tName")?;
                for list in lists {
                    writeln!(f, "{}\t{}", list.id, list.name)?;
                }
                Ok(())
            }
            ListsOutput::Empty { domain } => {
                writeln!(f, "No lists were found for site with domain name {domain}")
            }
        }
    }
}

pub async fn display_lists(
    db: &Database,
    provider: &dyn MailingListProvider,
    domain: &str,
) -> Result<ListsOutput, CommandError> {
    let site = db
        .site_by_domain(domain)
        .await?
        .ok_or_else(|| CommandError::UnknownSite(domain.to_string()))?;
    let config = db.site_config(site.id).await?;
    let credentials = config
        .mailchimp_credentials()
        .ok_or_else(|| CommandError::MissingCredentials(domain.to_string()))?;

    let lists = provider
        .lists(&credentials)
        .await
        .map_err(CommandError::MailingList)?;

    if lists.is_empty() {
        Ok(ListsOutput::Empty {
            domain: domain.to_string(),
        })
    } else {
        Ok(ListsOutput::Lists(lists))
    }
}
