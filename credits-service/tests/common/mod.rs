//! Test helper module for credits-service integration tests.
//!
//! Provides common setup utilities for PostgreSQL-based tests. Suites
//! self-skip when `TEST_DATABASE_URL` is not set so the workspace stays
//! green in environments without a database.

#![allow(dead_code)]

use credits_service::config::{CreditsConfig, DatabaseConfig};
use credits_service::services::{init_metrics, Database};
use credits_service::startup::Application;
use service_core::config::Config as CoreConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Get the database URL for testing, if configured.
pub fn get_test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_credits_{}_{}", std::process::id(), counter)
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: Database,
    pub client: reqwest::Client,
    schema_name: String,
    base_url: String,
}

impl TestApp {
    /// Spawn a new test application on a random port, or `None` when no
    /// test database is configured.
    pub async fn try_spawn() -> Option<Self> {
        init_metrics();

        let base_url = get_test_database_url()?;
        let schema_name = unique_schema_name();

        // Create schema for test isolation
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");

        pool.close().await;

        // Use ? or & depending on whether the URL already has query parameters
        let separator = if base_url.contains('?') { "&" } else { "?" };
        let db_url_with_schema = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let config = CreditsConfig {
            common: CoreConfig { port: 0 }, // Random port
            service_name: "credits-service-test".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: db_url_with_schema.clone(),
                max_connections: 5,
                min_connections: 1,
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = Database::new(&db_url_with_schema, 5, 1)
            .await
            .expect("Failed to create test database handle");

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            port,
            db,
            client,
            schema_name,
            base_url,
        })
    }

    /// Provision an account and return its id.
    pub async fn provision(&self) -> Uuid {
        let account_id = Uuid::new_v4();
        let response = self
            .client
            .post(format!("{}/accounts/{}", self.address, account_id))
            .send()
            .await
            .expect("provisioning request failed");
        assert!(response.status().is_success());
        account_id
    }

    /// Charge an account and return `(committed, used_credits)`.
    pub async fn charge(&self, account_id: Uuid, amount: i32) -> (bool, i32) {
        let response = self
            .client
            .post(format!("{}/accounts/{}/charge", self.address, account_id))
            .json(&serde_json::json!({ "amount": amount }))
            .send()
            .await
            .expect("charge request failed");
        assert!(response.status().is_success(), "{}", response.status());
        let body: serde_json::Value = response.json().await.unwrap();
        (
            body["committed"].as_bool().unwrap(),
            body["account"]["used_credits"].as_i64().unwrap() as i32,
        )
    }

    /// Fetch the account snapshot JSON.
    pub async fn get_account(&self, account_id: Uuid) -> serde_json::Value {
        let response = self
            .client
            .get(format!("{}/accounts/{}", self.address, account_id))
            .send()
            .await
            .expect("account request failed");
        assert!(response.status().is_success());
        response.json().await.unwrap()
    }

    /// Activate premium for an account (authenticated header).
    pub async fn activate_premium(&self, account_id: Uuid) -> serde_json::Value {
        let response = self
            .client
            .post(format!("{}/billing/confirm", self.address))
            .header("X-Account-ID", account_id.to_string())
            .send()
            .await
            .expect("activation request failed");
        assert!(response.status().is_success());
        response.json().await.unwrap()
    }

    /// Cleanup test resources (schema).
    pub async fn cleanup(&self) {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&self.base_url)
            .await
            .ok();

        if let Some(pool) = pool {
            let _ = sqlx::query(&format!(
                "DROP SCHEMA IF EXISTS {} CASCADE",
                self.schema_name
            ))
            .execute(&pool)
            .await;
            pool.close().await;
        }
    }
}
