use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::UserId;
use crate::storage::from_unix;
use crate::tenancy::SiteId;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(CountryId);
row_id!(CategoryId);
row_id!(CompanyId);
row_id!(
    /// Identifier wrapper for job postings.
    JobId
);

pub const MAX_TITLE_LENGTH: usize = 50;
pub const MAX_COMPANY_NAME_LENGTH: usize = 50;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 30;
pub const MAX_TWITTER_LENGTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub site_id: SiteId,
    pub name: String,
}

impl Category {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn path(&self) -> String {
        format!("/categories/{}/{}", self.id, self.slug())
    }

    pub fn feed_path(&self) -> String {
        format!("{}/feed", self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: CompanyId,
    pub site_id: SiteId,
    pub user_id: UserId,
    pub name: String,
    pub url: String,
    pub twitter: Option<String>,
    pub country_id: Option<CountryId>,
    /// Joined from `countries`; `None` means the company is fully virtual.
    pub country_name: Option<String>,
}

impl Company {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn path(&self) -> String {
        format!("/companies/{}/{}", self.id, self.slug())
    }
}

/// A job posting together with the names of the rows it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: JobId,
    pub site_id: SiteId,
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub country_id: Option<CountryId>,
    pub country_name: Option<String>,
    pub title: String,
    pub description: String,
    pub application_info: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub email: String,
    pub remote: bool,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expired_at.is_some()
    }

    /// Listed publicly: paid and not yet expired.
    pub fn is_active(&self) -> bool {
        self.paid_at.is_some() && self.expired_at.is_none()
    }

    pub fn format_country(&self) -> &str {
        match &self.country_name {
            Some(name) => name,
            None if !self.location.trim().is_empty() => "Anywhere*",
            None => "Anywhere",
        }
    }

    pub fn slug(&self) -> String {
        slugify(&self.title)
    }

    pub fn path(&self) -> String {
        format!("/jobs/{}/{}", self.id, self.slug())
    }

    /// `"<title> @ <company>"`, used for page and feed titles.
    pub fn headline(&self) -> String {
        format!("{} @ {}", self.title, self.company_name)
    }

    /// Date shown next to the posting; unpaid jobs fall back to creation time.
    pub fn post_date(&self) -> DateTime<Utc> {
        self.paid_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRow {
    pub id: JobId,
    pub site_id: SiteId,
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub country_id: Option<CountryId>,
    pub country_name: Option<String>,
    pub title: String,
    pub description: String,
    pub application_info: String,
    pub location: String,
    pub city: String,
    pub state: String,
    pub email: String,
    pub remote: bool,
    pub created_at: i64,
    pub paid_at: Option<i64>,
    pub expired_at: Option<i64>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            site_id: row.site_id,
            user_id: row.user_id,
            company_id: row.company_id,
            company_name: row.company_name,
            category_id: row.category_id,
            category_name: row.category_name,
            country_id: row.country_id,
            country_name: row.country_name,
            title: row.title,
            description: row.description,
            application_info: row.application_info,
            location: row.location,
            city: row.city,
            state: row.state,
            email: row.email,
            remote: row.remote,
            created_at: from_unix(row.created_at),
            paid_at: row.paid_at.map(from_unix),
            expired_at: row.expired_at.map(from_unix),
        }
    }
}

/// Job form payload used for both creation and edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    pub company_id: CompanyId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub country_id: Option<CountryId>,
    pub title: String,
    pub description: String,
    pub application_info: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub email: String,
    #[serde(default)]
    pub remote: bool,
}

impl JobDraft {
    pub fn validate(&self) -> Result<(), String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("title is required".to_string());
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(format!("title must be at most {MAX_TITLE_LENGTH} characters"));
        }
        if self.description.trim().is_empty() {
            return Err("description is required".to_string());
        }
        if self.application_info.trim().is_empty() {
            return Err("application info is required".to_string());
        }
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub country_id: Option<CountryId>,
}

impl CompanyDraft {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name is required".to_string());
        }
        if name.chars().count() > MAX_COMPANY_NAME_LENGTH {
            return Err(format!(
                "name must be at most {MAX_COMPANY_NAME_LENGTH} characters"
            ));
        }
        let url = self.url.trim();
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or_default();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(format!("'{url}' is not a valid URL"));
        }
        if let Some(handle) = self.twitter_handle() {
            if handle.chars().count() > MAX_TWITTER_LENGTH {
                return Err(format!(
                    "twitter must be at most {MAX_TWITTER_LENGTH} characters"
                ));
            }
        }
        Ok(())
    }

    /// Blank handles are stored as `NULL`.
    pub fn twitter_handle(&self) -> Option<&str> {
        self.twitter
            .as_deref()
            .map(str::trim)
            .filter(|handle| !handle.is_empty())
    }
}

pub fn validate_category_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("category name is required".to_string());
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(format!(
            "category name must be at most {MAX_CATEGORY_NAME_LENGTH} characters"
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && domain.contains('.') && !email.contains(' ') =>
        {
            Ok(())
        }
        _ => Err(format!("'{email}' is not a valid e-mail address")),
    }
}

/// Lowercase ASCII slug: drops characters other than letters, digits,
/// underscores, hyphens and whitespace, then joins words with single hyphens.
pub fn slugify(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let mut slug = String::with_capacity(kept.len());
    for word in kept
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(word);
    }
    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
