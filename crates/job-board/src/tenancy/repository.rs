//! Site and site configuration queries.

use super::domain::{Site, SiteConfig, SiteId, Tenant};
use crate::storage::{Database, DatabaseError};

const UPDATE_SITE_CONFIG_SQL: &str = "UPDATE site_configs SET expire_after = ?, admin_email = ?, \
    remote = ?, protocol = ?, price_in_cents = ?, google_analytics = ?, twitter = ?, \
    stripe_publishable_key = ?, stripe_secret_key = ?, twitter_access_token = ?, \
    mailchimp_username = ?, mailchimp_api_key = ?, mailchimp_list_id = ? WHERE site_id = ?";

impl Database {
    // =========================================================================
    // Site queries
    // =========================================================================

    /// Register a site. Its configuration row is created in the same transaction.
    pub async fn create_site(&self, domain: &str, name: &str) -> Result<Tenant, DatabaseError> {
        let domain = normalize_domain(domain);
        let mut tx = self.pool().begin().await?;

        let id = sqlx::query("INSERT INTO sites (domain, name) VALUES (?, ?)")
            .bind(&domain)
            .bind(name)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        let site = Site {
            id: SiteId(id),
            domain,
            name: name.to_string(),
        };
        let config = SiteConfig::defaults_for(&site);

        sqlx::query("INSERT INTO site_configs (site_id, expire_after, admin_email) VALUES (?, ?, ?)")
            .bind(site.id)
            .bind(config.expire_after)
            .bind(&config.admin_email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Tenant { site, config })
    }

    pub async fn get_site(&self, id: SiteId) -> Result<Site, DatabaseError> {
        sqlx::query_as::<_, Site>("SELECT id, domain, name FROM sites WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Site {id}")))
    }

    pub async fn site_by_domain(&self, domain: &str) -> Result<Option<Site>, DatabaseError> {
        let site = sqlx::query_as::<_, Site>("SELECT id, domain, name FROM sites WHERE domain = ?")
            .bind(normalize_domain(domain))
            .fetch_optional(self.pool())
            .await?;
        Ok(site)
    }

    pub async fn list_sites(&self) -> Result<Vec<Site>, DatabaseError> {
        let sites = sqlx::query_as::<_, Site>("SELECT id, domain, name FROM sites ORDER BY id")
            .fetch_all(self.pool())
            .await?;
        Ok(sites)
    }

    // =========================================================================
    // Site configuration queries
    // =========================================================================

    pub async fn site_config(&self, site_id: SiteId) -> Result<SiteConfig, DatabaseError> {
        sqlx::query_as::<_, SiteConfig>("SELECT * FROM site_configs WHERE site_id = ?")
            .bind(site_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("SiteConfig for site {site_id}")))
    }

    pub async fn tenant(&self, site: Site) -> Result<Tenant, DatabaseError> {
        let config = self.site_config(site.id).await?;
        Ok(Tenant { site, config })
    }

    /// Resolve the tenant serving `host` (an HTTP `Host` header value).
    pub async fn tenant_for_host(&self, host: &str) -> Result<Option<Tenant>, DatabaseError> {
        match self.site_by_domain(strip_port(host)).await? {
            Some(site) => Ok(Some(self.tenant(site).await?)),
            None => Ok(None),
        }
    }

    pub async fn tenants(&self) -> Result<Vec<Tenant>, DatabaseError> {
        let mut tenants = Vec::new();
        for site in self.list_sites().await? {
            tenants.push(self.tenant(site).await?);
        }
        Ok(tenants)
    }

    /// Overwrite every configurable column, returning the stored result.
    pub async fn save_site_config(&self, config: &SiteConfig) -> Result<SiteConfig, DatabaseError> {
        let site_id = config.site_id;
        sqlx::query(UPDATE_SITE_CONFIG_SQL)
            .bind(config.expire_after)
            .bind(&config.admin_email)
            .bind(config.remote)
            .bind(config.protocol)
            .bind(config.price_in_cents)
            .bind(&config.google_analytics)
            .bind(&config.twitter)
            .bind(&config.stripe_publishable_key)
            .bind(&config.stripe_secret_key)
            .bind(&config.twitter_access_token)
            .bind(&config.mailchimp_username)
            .bind(&config.mailchimp_api_key)
            .bind(&config.mailchimp_list_id)
            .bind(site_id)
            .execute(self.pool())
            .await?;

        self.site_config(site_id).await
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn strip_port(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        // IPv6 literal: "[::1]:3000"
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
