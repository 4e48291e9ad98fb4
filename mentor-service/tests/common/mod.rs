//! Test helper module for mentor-service integration tests.
//!
//! Spawns the full application against a real MongoDB (suites self-skip
//! when `TEST_MONGODB_URI` is not set) with the credits service faked by
//! a local mock HTTP server and the chat provider in mock mode.

#![allow(dead_code)]

use httpmock::prelude::*;
use mentor_service::config::{CreditsConfig, MentorConfig, MongoConfig, RelayConfig};
use mentor_service::services::init_metrics;
use mentor_service::startup::Application;
use serde_json::json;
use service_core::config::Config as CoreConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

static DB_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn get_test_mongodb_uri() -> Option<String> {
    std::env::var("TEST_MONGODB_URI").ok()
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub credits_server: MockServer,
    pub account_id: Uuid,
}

impl TestApp {
    /// Spawn a new test application on a random port, or `None` when no
    /// test MongoDB is configured.
    pub async fn try_spawn() -> Option<Self> {
        init_metrics();

        let mongodb_uri = get_test_mongodb_uri()?;
        let database = format!(
            "test_mentor_{}_{}",
            std::process::id(),
            DB_COUNTER.fetch_add(1, Ordering::SeqCst)
        );

        let credits_server = MockServer::start_async().await;
        let account_id = Uuid::new_v4();

        let config = MentorConfig {
            common: CoreConfig { port: 0 },
            service_name: "mentor-service-test".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
            mongodb: MongoConfig {
                uri: mongodb_uri,
                database,
            },
            // No API key: the application falls back to the mock provider.
            relay: RelayConfig {
                base_url: "http://localhost:1".to_string(),
                api_key: None,
                timeout_secs: 1,
            },
            credits: CreditsConfig {
                base_url: credits_server.base_url(),
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let address = format!("http://127.0.0.1:{}", port);
        let client = reqwest::Client::new();

        // Wait for the server to be ready by polling the health endpoint
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            client,
            credits_server,
            account_id,
        })
    }

    /// Stub the fake credits service with a healthy balance for the
    /// test account: lookups answer with `remaining` credits and charges
    /// commit.
    pub async fn stub_credits(&self, remaining: i32) {
        let account = json!({
            "account_id": self.account_id,
            "total_credits": 100,
            "used_credits": 100 - remaining,
            "remaining_credits": remaining,
            "plan_type": "standard",
            "is_active": true
        });

        let account_id = self.account_id;
        let lookup_body = account.clone();
        self.credits_server
            .mock_async(move |when, then| {
                when.method(GET).path(format!("/accounts/{}", account_id));
                then.status(200).json_body(lookup_body);
            })
            .await;

        let charged = json!({
            "committed": remaining > 0,
            "account": {
                "account_id": self.account_id,
                "total_credits": 100,
                "used_credits": 100 - remaining + 1,
                "remaining_credits": remaining - 1,
                "plan_type": "standard",
                "is_active": true
            }
        });
        self.credits_server
            .mock_async(move |when, then| {
                when.method(POST)
                    .path(format!("/accounts/{}/charge", account_id));
                then.status(200).json_body(charged);
            })
            .await;
    }

    /// POST an authenticated JSON request.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("X-Account-ID", self.account_id.to_string())
            .json(body)
            .send()
            .await
            .expect("request failed")
    }
}
