//! Countries, categories, companies and jobs, scoped to the owning site.

pub mod domain;
pub mod page;
pub mod repository;

pub use domain::{
    slugify, validate_category_name, validate_email, Category, CategoryId, Company, CompanyDraft,
    CompanyId, Country, CountryId, Job, JobDraft, JobId,
};
pub use page::{Page, PageWindow};

use tracing::info;

use crate::accounts::UserId;
use crate::storage::{Database, DatabaseError};
use crate::tenancy::{SiteId, Tenant};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    Invalid(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for CatalogError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound(what) => Self::NotFound(what),
            other => Self::Database(other),
        }
    }
}

/// Create an unpaid job. Remote-only sites force `remote` on.
pub async fn create_job(
    db: &Database,
    tenant: &Tenant,
    owner: UserId,
    mut draft: JobDraft,
) -> Result<Job, CatalogError> {
    prepare_job(db, tenant, &mut draft).await?;
    let job = db.create_job(tenant.id(), owner, &draft).await?;
    info!(site_id = %tenant.id(), job_id = %job.id, "job created");
    Ok(job)
}

pub async fn update_job(
    db: &Database,
    tenant: &Tenant,
    id: JobId,
    mut draft: JobDraft,
) -> Result<Job, CatalogError> {
    prepare_job(db, tenant, &mut draft).await?;
    Ok(db.update_job(tenant.id(), id, &draft).await?)
}

async fn prepare_job(db: &Database, tenant: &Tenant, draft: &mut JobDraft) -> Result<(), CatalogError> {
    draft.validate().map_err(CatalogError::Invalid)?;
    if tenant.config.remote {
        draft.remote = true;
    }

    // Company and category choices are limited to the request's site.
    if let Err(err) = db.get_company(tenant.id(), draft.company_id).await {
        return Err(choice_error(err, "company"));
    }
    if let Err(err) = db.get_category(tenant.id(), draft.category_id).await {
        return Err(choice_error(err, "category"));
    }
    ensure_country(db, draft.country_id).await
}

pub async fn create_company(
    db: &Database,
    site_id: SiteId,
    owner: UserId,
    draft: CompanyDraft,
) -> Result<Company, CatalogError> {
    draft.validate().map_err(CatalogError::Invalid)?;
    ensure_country(db, draft.country_id).await?;
    let company = db
        .create_company(site_id, owner, &draft)
        .await
        .map_err(|err| duplicate_name(err, "company", &draft.name))?;
    info!(site_id = %site_id, company_id = %company.id, "company created");
    Ok(company)
}

pub async fn update_company(
    db: &Database,
    site_id: SiteId,
    id: CompanyId,
    draft: CompanyDraft,
) -> Result<Company, CatalogError> {
    draft.validate().map_err(CatalogError::Invalid)?;
    ensure_country(db, draft.country_id).await?;
    db.update_company(site_id, id, &draft)
        .await
        .map_err(|err| duplicate_name(err, "company", &draft.name))
}

pub async fn add_category(
    db: &Database,
    site_id: SiteId,
    name: &str,
) -> Result<Category, CatalogError> {
    validate_category_name(name).map_err(CatalogError::Invalid)?;
    db.create_category(site_id, name)
        .await
        .map_err(|err| duplicate_name(err, "category", name))
}

async fn ensure_country(db: &Database, country_id: Option<CountryId>) -> Result<(), CatalogError> {
    match country_id {
        Some(id) => match db.get_country(id).await {
            Ok(_) => Ok(()),
            Err(err) => Err(choice_error(err, "country")),
        },
        None => Ok(()),
    }
}

fn choice_error(err: DatabaseError, field: &str) -> CatalogError {
    match err {
        DatabaseError::NotFound(_) => {
            CatalogError::Invalid(format!("select a valid {field}; that choice is not available"))
        }
        other => CatalogError::Database(other),
    }
}

fn duplicate_name(err: DatabaseError, kind: &str, name: &str) -> CatalogError {
    match err {
        DatabaseError::Conflict(_) => CatalogError::Conflict(format!(
            "a {kind} named '{}' already exists on this site",
            name.trim()
        )),
        other => other.into(),
    }
}
