mod common;

use common::{Fixture, GatewayBehaviour};
use job_board::payments::{ChargeError, PaymentError};
use job_board::tenancy::SiteConfigUpdate;
use rust_decimal::Decimal;

async fn stripe_fixture() -> Fixture {
    let mut fixture = Fixture::new().await;
    fixture
        .configure(SiteConfigUpdate {
            price: Some(Decimal::new(5025, 2)),
            stripe_publishable_key: Some("pk_test_123".to_string()),
            stripe_secret_key: Some("sk_test_123".to_string()),
            ..SiteConfigUpdate::default()
        })
        .await;
    fixture
}

#[tokio::test]
async fn card_charge_bills_the_site_price_and_activates_the_job() {
    let fixture = stripe_fixture().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let job = fixture.job(&owner, &company, &category, "Developer").await;

    let (job, receipt) = fixture
        .board
        .payments
        .charge_card(&fixture.tenant, &owner, job.id, "tok_visa")
        .await
        .unwrap();

    assert!(job.is_active());
    assert_eq!(receipt.amount_cents, 5025);
    let charges = fixture.gateway.charges.lock().unwrap().clone();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].amount_cents, 5025);
    assert_eq!(charges[0].currency, "usd");
    assert_eq!(charges[0].source, "tok_visa");
    assert_eq!(charges[0].description, format!("Tramcar job #{}", job.id));
}

#[tokio::test]
async fn declined_cards_leave_the_job_unpaid() {
    let fixture = stripe_fixture().await;
    fixture
        .gateway
        .set(GatewayBehaviour::Decline("Your card was declined.".to_string()));
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let job = fixture.job(&owner, &company, &category, "Developer").await;

    let err = fixture
        .board
        .payments
        .charge_card(&fixture.tenant, &owner, job.id, "tok_declined")
        .await
        .unwrap_err();
    assert!(matches!(err, ChargeError::Payment(PaymentError::Card(ref m)) if m == "Your card was declined."));

    let stored = fixture.db().get_job(fixture.tenant.id(), job.id).await.unwrap();
    assert!(!stored.is_paid());
}

#[tokio::test]
async fn paid_jobs_are_not_charged_again() {
    let fixture = stripe_fixture().await;
    let (owner, _) = fixture.user("owner", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let job = fixture.paid_job(&owner, &company, &category, "Developer", 1).await;

    let err = fixture
        .board
        .payments
        .charge_card(&fixture.tenant, &owner, job.id, "tok_visa")
        .await
        .unwrap_err();
    assert!(matches!(err, ChargeError::AlreadyPaid));
    assert_eq!(fixture.gateway.charge_count(), 0);
}

#[tokio::test]
async fn charges_need_stripe_credentials_and_ownership() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    let (stranger, _) = fixture.user("stranger", false).await;
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let job = fixture.job(&owner, &company, &category, "Developer").await;
    let payments = &fixture.board.payments;

    let err = payments
        .charge_card(&fixture.tenant, &owner, job.id, "tok_visa")
        .await
        .unwrap_err();
    assert!(matches!(err, ChargeError::Unavailable));

    let err = payments
        .charge_card(&fixture.tenant, &stranger, job.id, "tok_visa")
        .await
        .unwrap_err();
    assert!(matches!(err, ChargeError::NotFound));
    assert_eq!(fixture.gateway.charge_count(), 0);
}

#[tokio::test]
async fn token_redemption_spends_exactly_one_token() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    fixture.db().set_user_tokens(owner.id, 1).await.unwrap();
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let first = fixture.job(&owner, &company, &category, "First").await;
    let second = fixture.job(&owner, &company, &category, "Second").await;
    let payments = &fixture.board.payments;

    let (job, balance) = payments
        .redeem_token(&fixture.tenant, &owner, first.id)
        .await
        .unwrap();
    assert!(job.is_active());
    assert_eq!(balance.tokens, 0);

    let err = payments
        .redeem_token(&fixture.tenant, &owner, second.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ChargeError::NoTokens));
    assert_eq!(err.to_string(), "You do not have any tokens available");
    let stored = fixture.db().get_job(fixture.tenant.id(), second.id).await.unwrap();
    assert!(!stored.is_paid());
}

#[tokio::test]
async fn redeeming_for_a_paid_job_keeps_the_token() {
    let fixture = Fixture::new().await;
    let (owner, _) = fixture.user("owner", false).await;
    fixture.db().set_user_tokens(owner.id, 2).await.unwrap();
    let company = fixture.company(&owner, "Tramcar").await;
    let category = fixture.category("Software Development").await;
    let job = fixture.paid_job(&owner, &company, &category, "Developer", 1).await;

    let err = fixture
        .board
        .payments
        .redeem_token(&fixture.tenant, &owner, job.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ChargeError::AlreadyPaid));
    assert_eq!(fixture.db().user_tokens(owner.id).await.unwrap().tokens, 2);
}
