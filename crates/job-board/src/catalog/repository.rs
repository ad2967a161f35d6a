//! Country, category, company and job queries. Everything except countries is
//! scoped to a site.

use chrono::{DateTime, Utc};

use super::domain::{
    Category, CategoryId, Company, CompanyDraft, CompanyId, Country, CountryId, Job, JobDraft,
    JobId, JobRow,
};
use crate::accounts::UserId;
use crate::storage::{now, to_unix, Database, DatabaseError};
use crate::tenancy::SiteId;

const JOB_SELECT: &str = "SELECT j.id, j.site_id, j.user_id, j.company_id, co.name AS company_name, \
    j.category_id, ca.name AS category_name, j.country_id, cn.name AS country_name, j.title, \
    j.description, j.application_info, j.location, j.city, j.state, j.email, j.remote, \
    j.created_at, j.paid_at, j.expired_at \
    FROM jobs j \
    JOIN companies co ON co.id = j.company_id \
    JOIN categories ca ON ca.id = j.category_id \
    LEFT JOIN countries cn ON cn.id = j.country_id";

const COMPANY_SELECT: &str = "SELECT c.id, c.site_id, c.user_id, c.name, c.url, c.twitter, \
    c.country_id, cn.name AS country_name \
    FROM companies c LEFT JOIN countries cn ON cn.id = c.country_id";

const ACTIVE: &str = "j.paid_at IS NOT NULL AND j.expired_at IS NULL";

impl Database {
    // =========================================================================
    // Country queries
    // =========================================================================

    pub async fn create_country(&self, name: &str) -> Result<Country, DatabaseError> {
        let id = sqlx::query("INSERT INTO countries (name) VALUES (?)")
            .bind(name.trim())
            .execute(self.pool())
            .await?
            .last_insert_rowid();
        Ok(Country {
            id: CountryId(id),
            name: name.trim().to_string(),
        })
    }

    /// Returns `false` when a country with that name already exists.
    pub async fn insert_country_if_missing(&self, name: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("INSERT OR IGNORE INTO countries (name) VALUES (?)")
            .bind(name.trim())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn get_country(&self, id: CountryId) -> Result<Country, DatabaseError> {
        sqlx::query_as::<_, Country>("SELECT id, name FROM countries WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Country {id}")))
    }

    pub async fn list_countries(&self) -> Result<Vec<Country>, DatabaseError> {
        let countries =
            sqlx::query_as::<_, Country>("SELECT id, name FROM countries ORDER BY name")
                .fetch_all(self.pool())
                .await?;
        Ok(countries)
    }

    // =========================================================================
    // Category queries
    // =========================================================================

    pub async fn create_category(
        &self,
        site_id: SiteId,
        name: &str,
    ) -> Result<Category, DatabaseError> {
        let id = sqlx::query("INSERT INTO categories (site_id, name) VALUES (?, ?)")
            .bind(site_id)
            .bind(name.trim())
            .execute(self.pool())
            .await?
            .last_insert_rowid();
        self.get_category(site_id, CategoryId(id)).await
    }

    pub async fn get_category(
        &self,
        site_id: SiteId,
        id: CategoryId,
    ) -> Result<Category, DatabaseError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, site_id, name FROM categories WHERE id = ? AND site_id = ?",
        )
        .bind(id)
        .bind(site_id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Category {id}")))
    }

    pub async fn list_categories(&self, site_id: SiteId) -> Result<Vec<Category>, DatabaseError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, site_id, name FROM categories WHERE site_id = ? ORDER BY name",
        )
        .bind(site_id)
        .fetch_all(self.pool())
        .await?;
        Ok(categories)
    }

    pub async fn categories_with_active_jobs(
        &self,
        site_id: SiteId,
    ) -> Result<Vec<Category>, DatabaseError> {
        let sql = format!(
            "SELECT ca.id, ca.site_id, ca.name FROM categories ca \
             WHERE ca.site_id = ? AND EXISTS \
             (SELECT 1 FROM jobs j WHERE j.category_id = ca.id AND {ACTIVE}) \
             ORDER BY ca.name"
        );
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(site_id)
            .fetch_all(self.pool())
            .await?;
        Ok(categories)
    }

    // =========================================================================
    // Company queries
    // =========================================================================

    pub async fn create_company(
        &self,
        site_id: SiteId,
        user_id: UserId,
        draft: &CompanyDraft,
    ) -> Result<Company, DatabaseError> {
        let id = sqlx::query(
            "INSERT INTO companies (site_id, user_id, name, url, twitter, country_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(site_id)
        .bind(user_id)
        .bind(draft.name.trim())
        .bind(draft.url.trim())
        .bind(draft.twitter_handle())
        .bind(draft.country_id)
        .execute(self.pool())
        .await?
        .last_insert_rowid();
        self.get_company(site_id, CompanyId(id)).await
    }

    pub async fn get_company(
        &self,
        site_id: SiteId,
        id: CompanyId,
    ) -> Result<Company, DatabaseError> {
        let sql = format!("{COMPANY_SELECT} WHERE c.id = ? AND c.site_id = ?");
        sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .bind(site_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Company {id}")))
    }

    pub async fn update_company(
        &self,
        site_id: SiteId,
        id: CompanyId,
        draft: &CompanyDraft,
    ) -> Result<Company, DatabaseError> {
        sqlx::query(
            "UPDATE companies SET name = ?, url = ?, twitter = ?, country_id = ? \
             WHERE id = ? AND site_id = ?",
        )
        .bind(draft.name.trim())
        .bind(draft.url.trim())
        .bind(draft.twitter_handle())
        .bind(draft.country_id)
        .bind(id)
        .bind(site_id)
        .execute(self.pool())
        .await?;
        self.get_company(site_id, id).await
    }

    pub async fn list_companies(&self, site_id: SiteId) -> Result<Vec<Company>, DatabaseError> {
        let sql = format!("{COMPANY_SELECT} WHERE c.site_id = ? ORDER BY c.name");
        let companies = sqlx::query_as::<_, Company>(&sql)
            .bind(site_id)
            .fetch_all(self.pool())
            .await?;
        Ok(companies)
    }

    pub async fn count_companies_with_paid_jobs(
        &self,
        site_id: SiteId,
    ) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM companies c WHERE c.site_id = ? AND EXISTS \
             (SELECT 1 FROM jobs j WHERE j.company_id = c.id AND j.paid_at IS NOT NULL)",
        )
        .bind(site_id)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    pub async fn companies_with_paid_jobs(
        &self,
        site_id: SiteId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Company>, DatabaseError> {
        let sql = format!(
            "{COMPANY_SELECT} WHERE c.site_id = ? AND EXISTS \
             (SELECT 1 FROM jobs j WHERE j.company_id = c.id AND j.paid_at IS NOT NULL) \
             ORDER BY c.name LIMIT ? OFFSET ?"
        );
        let companies = sqlx::query_as::<_, Company>(&sql)
            .bind(site_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?;
        Ok(companies)
    }

    // =========================================================================
    // Job queries
    // =========================================================================

    pub async fn create_job(
        &self,
        site_id: SiteId,
        user_id: UserId,
        draft: &JobDraft,
    ) -> Result<Job, DatabaseError> {
        let id = sqlx::query(
            "INSERT INTO jobs (site_id, user_id, company_id, category_id, country_id, title, \
             description, application_info, location, city, state, email, remote, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(site_id)
        .bind(user_id)
        .bind(draft.company_id)
        .bind(draft.category_id)
        .bind(draft.country_id)
        .bind(draft.title.trim())
        .bind(&draft.description)
        .bind(&draft.application_info)
        .bind(draft.location.trim())
        .bind(draft.city.trim())
        .bind(draft.state.trim())
        .bind(draft.email.trim())
        .bind(draft.remote)
        .bind(to_unix(now()))
        .execute(self.pool())
        .await?
        .last_insert_rowid();
        self.get_job(site_id, JobId(id)).await
    }

    pub async fn get_job(&self, site_id: SiteId, id: JobId) -> Result<Job, DatabaseError> {
        let sql = format!("{JOB_SELECT} WHERE j.id = ? AND j.site_id = ?");
        sqlx::query_as::<_, JobRow>(&sql)
            .bind(id)
            .bind(site_id)
            .fetch_optional(self.pool())
            .await?
            .map(Job::from)
            .ok_or_else(|| DatabaseError::NotFound(format!("Job {id}")))
    }

    pub async fn update_job(
        &self,
        site_id: SiteId,
        id: JobId,
        draft: &JobDraft,
    ) -> Result<Job, DatabaseError> {
        sqlx::query(
            "UPDATE jobs SET company_id = ?, category_id = ?, country_id = ?, title = ?, \
             description = ?, application_info = ?, location = ?, city = ?, state = ?, \
             email = ?, remote = ? WHERE id = ? AND site_id = ?",
        )
        .bind(draft.company_id)
        .bind(draft.category_id)
        .bind(draft.country_id)
        .bind(draft.title.trim())
        .bind(&draft.description)
        .bind(&draft.application_info)
        .bind(draft.location.trim())
        .bind(draft.city.trim())
        .bind(draft.state.trim())
        .bind(draft.email.trim())
        .bind(draft.remote)
        .bind(id)
        .bind(site_id)
        .execute(self.pool())
        .await?;
        self.get_job(site_id, id).await
    }

    /// Newest first by payment time.
    pub async fn latest_active_jobs(
        &self,
        site_id: SiteId,
        limit: i64,
    ) -> Result<Vec<Job>, DatabaseError> {
        let sql = format!(
            "{JOB_SELECT} WHERE j.site_id = ? AND {ACTIVE} \
             ORDER BY j.paid_at DESC, j.id DESC LIMIT ?"
        );
        self.fetch_jobs(sqlx::query_as::<_, JobRow>(&sql).bind(site_id).bind(limit))
            .await
    }

    /// `None` lists every active job in the category.
    pub async fn active_jobs_in_category(
        &self,
        site_id: SiteId,
        category_id: CategoryId,
        limit: Option<i64>,
    ) -> Result<Vec<Job>, DatabaseError> {
        let sql = format!(
            "{JOB_SELECT} WHERE j.site_id = ? AND j.category_id = ? AND {ACTIVE} \
             ORDER BY j.paid_at DESC, j.id DESC LIMIT ?"
        );
        self.fetch_jobs(
            sqlx::query_as::<_, JobRow>(&sql)
                .bind(site_id)
                .bind(category_id)
                .bind(limit.unwrap_or(-1)),
        )
        .await
    }

    /// Active and expired listings of a company.
    pub async fn paid_jobs_for_company(
        &self,
        site_id: SiteId,
        company_id: CompanyId,
    ) -> Result<Vec<Job>, DatabaseError> {
        let sql = format!(
            "{JOB_SELECT} WHERE j.site_id = ? AND j.company_id = ? AND j.paid_at IS NOT NULL \
             ORDER BY j.paid_at DESC, j.id DESC"
        );
        self.fetch_jobs(
            sqlx::query_as::<_, JobRow>(&sql)
                .bind(site_id)
                .bind(company_id),
        )
        .await
    }

    pub async fn count_jobs_for_user(
        &self,
        site_id: SiteId,
        user_id: UserId,
    ) -> Result<i64, DatabaseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE site_id = ? AND user_id = ?")
                .bind(site_id)
                .bind(user_id)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    pub async fn jobs_for_user(
        &self,
        site_id: SiteId,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, DatabaseError> {
        let sql = format!(
            "{JOB_SELECT} WHERE j.site_id = ? AND j.user_id = ? \
             ORDER BY j.created_at DESC, j.id DESC LIMIT ? OFFSET ?"
        );
        self.fetch_jobs(
            sqlx::query_as::<_, JobRow>(&sql)
                .bind(site_id)
                .bind(user_id)
                .bind(limit)
                .bind(offset),
        )
        .await
    }

    /// Active jobs paid strictly after `since`, grouped by category name and
    /// ordered by payment time within each category.
    pub async fn active_jobs_paid_since(
        &self,
        site_id: SiteId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Job>, DatabaseError> {
        let sql = format!(
            "{JOB_SELECT} WHERE j.site_id = ? AND {ACTIVE} AND j.paid_at > ? \
             ORDER BY ca.name, j.paid_at, j.id"
        );
        self.fetch_jobs(
            sqlx::query_as::<_, JobRow>(&sql)
                .bind(site_id)
                .bind(to_unix(since)),
        )
        .await
    }

    /// Active jobs paid before `cutoff`.
    pub async fn expirable_jobs(
        &self,
        site_id: SiteId,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Job>, DatabaseError> {
        let sql = format!(
            "{JOB_SELECT} WHERE j.site_id = ? AND {ACTIVE} AND j.paid_at < ? \
             ORDER BY j.paid_at, j.id"
        );
        self.fetch_jobs(
            sqlx::query_as::<_, JobRow>(&sql)
                .bind(site_id)
                .bind(to_unix(cutoff)),
        )
        .await
    }

    /// Stamp `paid_at` unless it is already set. Returns whether this call won.
    pub async fn mark_job_paid(
        &self,
        id: JobId,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE jobs SET paid_at = ? WHERE id = ? AND paid_at IS NULL")
            .bind(to_unix(at))
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Stamp `expired_at` on a paid, unexpired job. Returns whether this call won.
    pub async fn mark_job_expired(
        &self,
        id: JobId,
        at: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE jobs SET expired_at = ? \
             WHERE id = ? AND paid_at IS NOT NULL AND expired_at IS NULL",
        )
        .bind(to_unix(at))
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn fetch_jobs<'q>(
        &self,
        query: sqlx::query::QueryAs<'q, sqlx::Sqlite, JobRow, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> Result<Vec<Job>, DatabaseError> {
        let rows = query.fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(Job::from).collect())
    }
}
