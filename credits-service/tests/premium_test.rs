//! Premium activation integration tests for credits-service.

mod common;

use chrono::{DateTime, Duration, Utc};
use common::TestApp;
use uuid::Uuid;

macro_rules! spawn_or_skip {
    () => {
        match TestApp::try_spawn().await {
            Some(app) => app,
            None => {
                eprintln!("Skipping test: TEST_DATABASE_URL is not set");
                return;
            }
        }
    };
}

#[tokio::test]
async fn activation_resets_the_ledger_to_premium() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    let (committed, _) = app.charge(account_id, 40).await;
    assert!(committed);

    let confirmation = app.activate_premium(account_id).await;
    assert_eq!(confirmation["success"], true);
    assert_eq!(confirmation["credits_granted"], 1000);

    let account = app.get_account(account_id).await;
    assert_eq!(account["total_credits"], 1000);
    assert_eq!(account["used_credits"], 0);
    assert_eq!(account["plan_type"], "unlimited");
    assert_eq!(account["is_active"], true);

    app.cleanup().await;
}

#[tokio::test]
async fn activation_grants_a_thirty_day_window() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    let confirmation = app.activate_premium(account_id).await;

    let expires: DateTime<Utc> = confirmation["expires_utc"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let days = (expires - Utc::now()).num_days();
    assert!((29..=30).contains(&days), "expiry {} days out", days);

    app.cleanup().await;
}

#[tokio::test]
async fn reactivation_extends_from_now() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    app.activate_premium(account_id).await;
    let (committed, _) = app.charge(account_id, 7).await;
    assert!(committed);

    let confirmation = app.activate_premium(account_id).await;
    assert_eq!(confirmation["success"], true);

    let account = app.get_account(account_id).await;
    assert_eq!(account["total_credits"], 1000);
    assert_eq!(account["used_credits"], 0);

    let expires: DateTime<Utc> = confirmation["expires_utc"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(expires > Utc::now() + Duration::days(29));

    app.cleanup().await;
}

#[tokio::test]
async fn activation_provisions_unknown_accounts() {
    let app = spawn_or_skip!();

    // A brand-new account id, never provisioned. Billing confirmation
    // must still succeed and leave a full premium ledger behind.
    let account_id = Uuid::new_v4();
    let confirmation = app.activate_premium(account_id).await;
    assert_eq!(confirmation["success"], true);

    let account = app.get_account(account_id).await;
    assert_eq!(account["total_credits"], 1000);
    assert_eq!(account["plan_type"], "unlimited");

    app.cleanup().await;
}

#[tokio::test]
async fn activation_requires_an_authenticated_account() {
    let app = spawn_or_skip!();

    let response = app
        .client
        .post(format!("{}/billing/confirm", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);

    app.cleanup().await;
}
