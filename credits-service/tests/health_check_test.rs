//! Health and readiness endpoint tests for credits-service.

mod common;

use common::TestApp;

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
async fn health_check_works() {
    let app = spawn_or_skip!();

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    app.cleanup().await;
}

#[tokio::test]
async fn readiness_reflects_database_connectivity() {
    let app = spawn_or_skip!();

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");

    app.cleanup().await;
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = spawn_or_skip!();

    // Produce at least one recorded charge so counters exist.
    let account_id = app.provision().await;
    let (committed, _) = app.charge(account_id, 1).await;
    assert!(committed);

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("credits_charges_total"));

    app.cleanup().await;
}
