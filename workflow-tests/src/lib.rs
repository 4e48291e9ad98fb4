//! Cross-service workflow integration tests library.
//!
//! Provides test infrastructure for running end-to-end tests across the
//! credits and mentor services. Tests talk to running services over HTTP
//! and verify complete metered workflows.
//!
//! Opt in by setting `WORKFLOW_TESTS=1` with both services (and their
//! backing stores) up; otherwise every test skips.

use anyhow::{anyhow, Result};
use std::sync::Once;
use std::time::Duration;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Service endpoint configuration from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub credits: String,
    pub mentor: String,
}

impl ServiceEndpoints {
    /// Load endpoints from environment variables or use defaults.
    pub fn from_env() -> Self {
        Self {
            credits: std::env::var("CREDITS_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3005".to_string()),
            mentor: std::env::var("MENTOR_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3006".to_string()),
        }
    }

    /// Get health check URLs for all services.
    pub fn health_urls(&self) -> Vec<(&'static str, String)> {
        vec![
            ("credits", format!("{}/health", self.credits)),
            ("mentor", format!("{}/health", self.mentor)),
        ]
    }
}

/// Context for workflow tests.
///
/// Each test creates a new context with its own account for isolation.
pub struct WorkflowTestContext {
    /// Unique account ID for this test
    pub account_id: Uuid,
    pub endpoints: ServiceEndpoints,
    pub client: reqwest::Client,
}

impl WorkflowTestContext {
    pub async fn new() -> Result<Self> {
        init_tracing();

        Ok(Self {
            account_id: Uuid::new_v4(),
            endpoints: ServiceEndpoints::from_env(),
            client: reqwest::Client::new(),
        })
    }

    /// POST a JSON body to the mentor service with the account header.
    pub async fn mentor_post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.endpoints.mentor, path))
            .header("X-Account-ID", self.account_id.to_string())
            .json(body)
            .send()
            .await?)
    }

    /// Fetch the account's credit snapshot.
    pub async fn credit_snapshot(&self) -> Result<serde_json::Value> {
        Ok(self
            .client
            .get(format!(
                "{}/accounts/{}",
                self.endpoints.credits, self.account_id
            ))
            .send()
            .await?
            .json()
            .await?)
    }

    /// Activate premium for the test account via the billing confirm hook.
    pub async fn activate_premium(&self) -> Result<serde_json::Value> {
        Ok(self
            .client
            .post(format!("{}/billing/confirm", self.endpoints.credits))
            .header("X-Account-ID", self.account_id.to_string())
            .send()
            .await?
            .json()
            .await?)
    }
}

/// Wait for all services to be healthy.
///
/// Polls health endpoints until all services respond with 200 OK.
/// Times out after the specified duration.
pub async fn wait_for_services(timeout: Duration) -> Result<()> {
    let endpoints = ServiceEndpoints::from_env();
    let health_urls = endpoints.health_urls();
    let client = reqwest::Client::new();
    let start = std::time::Instant::now();

    tracing::info!("Waiting for {} services to be healthy...", health_urls.len());

    loop {
        let mut all_healthy = true;
        let mut unhealthy_services = Vec::new();

        for (name, url) in &health_urls {
            match client.get(url).timeout(Duration::from_secs(2)).send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    all_healthy = false;
                    unhealthy_services.push(format!("{} (status: {})", name, resp.status()));
                }
                Err(e) => {
                    all_healthy = false;
                    unhealthy_services.push(format!("{} (error: {})", name, e));
                }
            }
        }

        if all_healthy {
            tracing::info!("All services are healthy");
            return Ok(());
        }

        if start.elapsed() > timeout {
            return Err(anyhow!(
                "Timeout waiting for services. Unhealthy: {}",
                unhealthy_services.join(", ")
            ));
        }

        tracing::debug!("Waiting for services: {}", unhealthy_services.join(", "));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
