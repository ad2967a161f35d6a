//! Site registry: tenants, their configuration, and request-to-tenant resolution.

pub mod domain;
pub mod repository;

pub use domain::{
    price_to_cents, Protocol, Site, SiteConfig, SiteConfigUpdate, SiteId, Tenant,
    DEFAULT_EXPIRE_AFTER_DAYS, MAX_EXPIRE_AFTER_DAYS,
};

use crate::storage::{Database, DatabaseError};

/// Error raised while changing a site's configuration.
#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    #[error("invalid site configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Validate and persist an operator's configuration change.
pub async fn configure_site(
    db: &Database,
    site_id: SiteId,
    update: SiteConfigUpdate,
) -> Result<SiteConfig, TenancyError> {
    let mut config = db.site_config(site_id).await?;
    update.apply(&mut config).map_err(TenancyError::Invalid)?;
    let stored = db.save_site_config(&config).await?;
    tracing::info!(site_id = %site_id, "site configuration updated");
    Ok(stored)
}
