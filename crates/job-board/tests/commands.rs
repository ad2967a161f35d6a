mod common;

use chrono::Utc;
use common::{FakeMailingList, Fixture};
use job_board::commands::{display_lists, send_mailshots, CommandError, ListsOutput};
use job_board::integrations::MailingList;
use job_board::tenancy::SiteConfigUpdate;

fn mailchimp() -> SiteConfigUpdate {
    SiteConfigUpdate {
        mailchimp_username: Some("board".to_string()),
        mailchimp_api_key: Some("abc123-us6".to_string()),
        mailchimp_list_id: Some("list-1".to_string()),
        ..SiteConfigUpdate::default()
    }
}

#[tokio::test]
async fn mailshot_groups_last_weeks_jobs_by_category() {
    let mut fixture = Fixture::new().await;
    fixture.configure(mailchimp()).await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let software = fixture.category("Software Development").await;
    let design = fixture.category("Design").await;
    fixture.paid_job(&owner, &company, &software, "Rust Developer", 2).await;
    fixture.paid_job(&owner, &company, &design, "Illustrator", 1).await;
    fixture.paid_job(&owner, &company, &software, "Too Old", 9).await;
    fixture.job(&owner, &company, &software, "Unpaid").await;

    let reports = send_mailshots(fixture.db(), fixture.lists.as_ref(), Utc::now())
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].to_string(), "[Tramcar] mailshot sent: true");

    let campaigns = fixture.lists.campaigns.lock().unwrap().clone();
    assert_eq!(campaigns.len(), 1);
    let campaign = &campaigns[0];
    assert_eq!(campaign.list_id, "list-1");
    assert_eq!(
        campaign.subject,
        "[TRAMCAR] *ALL* jobs posted in the last 7 days"
    );
    assert_eq!(campaign.from_name, "Tramcar Weekly Mailer");
    assert_eq!(campaign.reply_to, "admin@tramcar.org");

    let design_at = campaign.body.find("Design").unwrap();
    let software_at = campaign.body.find("Software Development").unwrap();
    assert!(design_at < software_at, "categories are ordered by name");
    assert!(campaign.body.contains("Rust Developer @ Tramcar"));
    assert!(!campaign.body.contains("Too Old"));
    assert!(!campaign.body.contains("Unpaid"));
}

#[tokio::test]
async fn mailshot_skips_sites_without_new_jobs_or_credentials() {
    let mut fixture = Fixture::new().await;
    let reports = send_mailshots(fixture.db(), fixture.lists.as_ref(), Utc::now())
        .await
        .unwrap();
    assert!(!reports[0].sent);

    fixture.configure(mailchimp()).await;
    let reports = send_mailshots(fixture.db(), fixture.lists.as_ref(), Utc::now())
        .await
        .unwrap();
    assert!(!reports[0].sent);
    assert!(fixture.lists.campaigns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_campaigns_are_reported_not_raised() {
    let mut fixture = Fixture::with_mailing_list(FakeMailingList {
        fail: true,
        ..FakeMailingList::default()
    })
    .await;
    fixture.configure(mailchimp()).await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    fixture.paid_job(&owner, &company, &category, "Developer", 1).await;

    let reports = send_mailshots(fixture.db(), fixture.lists.as_ref(), Utc::now())
        .await
        .unwrap();
    assert_eq!(reports[0].to_string(), "[Tramcar] mailshot sent: false");
}

#[tokio::test]
async fn display_lists_prints_ids_and_names() {
    let mut fixture = Fixture::with_mailing_list(FakeMailingList {
        lists: vec![MailingList {
            id: "list-1".to_string(),
            name: "Weekly jobs".to_string(),
        }],
        ..FakeMailingList::default()
    })
    .await;

    let err = display_lists(fixture.db(), fixture.lists.as_ref(), "tramcar.org")
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::MissingCredentials(_)));

    fixture.configure(mailchimp()).await;
    let output = display_lists(fixture.db(), fixture.lists.as_ref(), "tramcar.org")
        .await
        .unwrap();
    assert!(matches!(output, ListsOutput::Lists(ref lists) if lists.len() == 1));
    assert!(output.to_string().contains("list-1\tWeekly jobs"));

    let err = display_lists(fixture.db(), fixture.lists.as_ref(), "unknown.org")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Site with domain name unknown.org does not exist"
    );
}
