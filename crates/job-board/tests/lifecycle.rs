mod common;

use chrono::{Duration, Utc};
use common::Fixture;
use job_board::commands::expire_jobs;
use job_board::tenancy::{configure_site, SiteConfigUpdate, TenancyError};

#[tokio::test]
async fn activating_an_unpaid_job_stamps_paid_at_and_announces_it() {
    let mut fixture = Fixture::new().await;
    fixture
        .configure(SiteConfigUpdate {
            twitter_access_token: Some("user-context-token".to_string()),
            ..SiteConfigUpdate::default()
        })
        .await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let mut job = fixture
        .job(&owner, &company, &category, "Software Developer")
        .await;

    assert!(fixture.board.lifecycle.activate(&fixture.tenant, &mut job).await.unwrap());
    assert!(job.is_active());

    let stored = fixture.db().get_job(fixture.tenant.id(), job.id).await.unwrap();
    assert_eq!(stored.paid_at, job.paid_at);
    assert_eq!(
        *fixture.social.posts.lock().unwrap(),
        vec![format!(
            "Software Developer @ Tramcar http://tramcar.org/jobs/{}/software-developer",
            job.id
        )]
    );
}

#[tokio::test]
async fn activating_twice_leaves_paid_at_unchanged() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let mut job = fixture
        .paid_job(&owner, &company, &category, "Software Developer", 3)
        .await;
    let paid_at = job.paid_at;

    assert!(!fixture.board.lifecycle.activate(&fixture.tenant, &mut job).await.unwrap());
    let stored = fixture.db().get_job(fixture.tenant.id(), job.id).await.unwrap();
    assert_eq!(stored.paid_at, paid_at);
}

#[tokio::test]
async fn stale_copies_cannot_activate_a_job_twice() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let job = fixture
        .job(&owner, &company, &category, "Software Developer")
        .await;

    let mut first = job.clone();
    let mut second = job;
    let lifecycle = &fixture.board.lifecycle;
    assert!(lifecycle.activate(&fixture.tenant, &mut first).await.unwrap());
    assert!(!lifecycle.activate(&fixture.tenant, &mut second).await.unwrap());
    assert!(second.paid_at.is_none(), "losing copy is not stamped");
}

#[tokio::test]
async fn sites_without_social_credentials_or_in_debug_mode_do_not_post() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let mut job = fixture.job(&owner, &company, &category, "Developer").await;
    assert!(fixture.board.lifecycle.activate(&fixture.tenant, &mut job).await.unwrap());
    assert!(fixture.social.posts.lock().unwrap().is_empty());

    let mut fixture = Fixture::debug().await;
    fixture
        .configure(SiteConfigUpdate {
            twitter_access_token: Some("user-context-token".to_string()),
            ..SiteConfigUpdate::default()
        })
        .await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let mut job = fixture.job(&owner, &company, &category, "Developer").await;
    assert!(fixture.board.lifecycle.activate(&fixture.tenant, &mut job).await.unwrap());
    assert!(fixture.social.posts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn expiring_requires_an_active_job() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let lifecycle = &fixture.board.lifecycle;

    let mut unpaid = fixture.job(&owner, &company, &category, "Unpaid").await;
    assert!(!lifecycle.expire(&fixture.tenant, &mut unpaid).await.unwrap());
    assert!(unpaid.expired_at.is_none());

    let mut active = fixture.paid_job(&owner, &company, &category, "Active", 1).await;
    assert!(lifecycle.expire(&fixture.tenant, &mut active).await.unwrap());
    assert!(active.is_expired());
    let expired_at = active.expired_at;
    assert!(!lifecycle.expire(&fixture.tenant, &mut active).await.unwrap());
    assert_eq!(active.expired_at, expired_at);

    assert_eq!(
        fixture.mailer.subjects(),
        vec!["Your Tramcar job has expired".to_string()]
    );
}

#[tokio::test]
async fn batch_expiry_only_touches_jobs_past_the_window() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let old = fixture.paid_job(&owner, &company, &category, "Old", 31).await;
    let fresh = fixture.paid_job(&owner, &company, &category, "Fresh", 5).await;
    let unpaid = fixture.job(&owner, &company, &category, "Unpaid").await;

    let reports = expire_jobs(fixture.db(), &fixture.board.lifecycle, Utc::now())
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].to_string(), "[Tramcar] 1 jobs expired");

    let site = fixture.tenant.id();
    assert!(fixture.db().get_job(site, old.id).await.unwrap().is_expired());
    assert!(fixture.db().get_job(site, fresh.id).await.unwrap().is_active());
    let unpaid = fixture.db().get_job(site, unpaid.id).await.unwrap();
    assert!(!unpaid.is_paid() && !unpaid.is_expired());

    // Running again a day later does nothing new.
    let reports = expire_jobs(
        fixture.db(),
        &fixture.board.lifecycle,
        Utc::now() + Duration::days(1),
    )
    .await
    .unwrap();
    assert_eq!(reports[0].expired, 0);
}

#[tokio::test]
async fn out_of_range_windows_do_not_stop_other_sites_expiring() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let old = fixture.paid_job(&owner, &company, &category, "Old", 31).await;

    let other = fixture
        .db()
        .create_site("remote.tramcar.org", "Remote Tramcar")
        .await
        .unwrap();
    let mut config = other.config.clone();
    config.expire_after = 1_000_000_000;
    fixture.db().save_site_config(&config).await.unwrap();

    let reports = expire_jobs(fixture.db(), &fixture.board.lifecycle, Utc::now())
        .await
        .unwrap();
    let lines: Vec<String> = reports.iter().map(ToString::to_string).collect();
    assert!(lines.contains(&"[Tramcar] 1 jobs expired".to_string()));
    assert!(lines.contains(&"[Remote Tramcar] 0 jobs expired".to_string()));
    assert!(fixture
        .db()
        .get_job(fixture.tenant.id(), old.id)
        .await
        .unwrap()
        .is_expired());
}

#[tokio::test]
async fn site_configuration_rejects_oversized_expiry_windows() {
    let fixture = Fixture::new().await;
    let err = configure_site(
        fixture.db(),
        fixture.tenant.id(),
        SiteConfigUpdate {
            expire_after: Some(1_000_000_000),
            ..SiteConfigUpdate::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TenancyError::Invalid(_)));

    let stored = fixture.db().site_config(fixture.tenant.id()).await.unwrap();
    assert_eq!(stored.expire_after, 30);
}
