//! Charge semantics integration tests for credits-service.
//!
//! These cover the ledger invariants: the ceiling can never be crossed for
//! standard accounts, exact fits commit, unlimited-active accounts always
//! commit while still recording usage, and concurrent charges against the
//! last remaining credit commit exactly once.

mod common;

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
async fn overcharge_is_refused_without_mutation() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    let (committed, used) = app.charge(account_id, 99).await;
    assert!(committed);
    assert_eq!(used, 99);

    // {total: 100, used: 99}, charge(5) must refuse and leave used at 99.
    let (committed, used) = app.charge(account_id, 5).await;
    assert!(!committed);
    assert_eq!(used, 99);

    app.cleanup().await;
}

#[tokio::test]
async fn exact_fit_commits_to_the_ceiling() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    let (committed, _) = app.charge(account_id, 99).await;
    assert!(committed);

    // {total: 100, used: 99}, charge(1) fills the allotment exactly.
    let (committed, used) = app.charge(account_id, 1).await;
    assert!(committed);
    assert_eq!(used, 100);

    // Nothing further commits.
    let (committed, used) = app.charge(account_id, 1).await;
    assert!(!committed);
    assert_eq!(used, 100);

    app.cleanup().await;
}

#[tokio::test]
async fn unlimited_active_account_always_commits() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    app.activate_premium(account_id).await;

    // Burn past the premium allotment; the ceiling must not apply, but
    // usage is still recorded for observability.
    let (committed, _) = app.charge(account_id, 1000).await;
    assert!(committed);
    let (committed, used) = app.charge(account_id, 5).await;
    assert!(committed);
    assert_eq!(used, 1005);

    app.cleanup().await;
}

#[tokio::test]
async fn zero_amount_charge_is_rejected() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    let response = app
        .client
        .post(format!("{}/accounts/{}/charge", app.address, account_id))
        .json(&serde_json::json!({ "amount": 0 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn charging_unknown_account_returns_not_found() {
    let app = spawn_or_skip!();

    let response = app
        .client
        .post(format!(
            "{}/accounts/{}/charge",
            app.address,
            Uuid::new_v4()
        ))
        .json(&serde_json::json!({ "amount": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_charges_for_last_credit_commit_exactly_once() {
    let app = spawn_or_skip!();

    let account_id = app.provision().await;
    let (committed, _) = app.charge(account_id, 99).await;
    assert!(committed);

    // One credit left; two racing charges must not both pass the ceiling.
    let client_a = app.client.clone();
    let client_b = app.client.clone();
    let url = format!("{}/accounts/{}/charge", app.address, account_id);
    let (url_a, url_b) = (url.clone(), url);

    let charge = |client: reqwest::Client, url: String| async move {
        let response = client
            .post(url)
            .json(&serde_json::json!({ "amount": 1 }))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        body["committed"].as_bool().unwrap()
    };

    let (a, b) = tokio::join!(charge(client_a, url_a), charge(client_b, url_b));
    assert!(a ^ b, "exactly one of two racing charges must commit");

    let account = app.get_account(account_id).await;
    assert_eq!(account["used_credits"], 100);

    app.cleanup().await;
}
