//! Typed HTTP client for the credits service.
//!
//! Callers that meter AI usage go through [`CreditsApi`] rather than the
//! raw HTTP surface so the gate logic can be tested against mock
//! implementations. Any transport or server failure maps to
//! `AppError::CreditsUnavailable` - a metered action must fail closed when
//! the balance cannot be verified, never proceed unmetered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppError;

/// Snapshot of an account's credit balance and subscription, as served by
/// the credits service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub account_id: Uuid,
    pub total_credits: i32,
    pub used_credits: i32,
    pub remaining_credits: i32,
    pub plan_type: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_expires_utc: Option<DateTime<Utc>>,
}

impl AccountView {
    /// Whether the account bypasses the credit ceiling right now.
    pub fn is_unlimited_active(&self) -> bool {
        self.plan_type == "unlimited"
            && self.is_active
            && self
                .premium_expires_utc
                .map(|expires| expires > Utc::now())
                .unwrap_or(true)
    }

    /// Advisory affordability check over this cached snapshot.
    ///
    /// Purely local - the authoritative decision is made by `charge`, which
    /// re-reads state on the server. This only exists so callers can skip
    /// the provider call (and give immediate feedback) when the last known
    /// balance is already exhausted.
    pub fn can_afford(&self, required: i32) -> bool {
        self.is_unlimited_active() || self.remaining_credits >= required
    }
}

/// Result of an authoritative charge attempt.
///
/// `committed == false` is the expected insufficient-balance outcome, not
/// an error: the server refused to commit and the balance is unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeOutcome {
    pub committed: bool,
    pub account: AccountView,
}

/// Access to the credit ledger, as seen by metered features.
#[async_trait]
pub trait CreditsApi: Send + Sync {
    /// Fetch the account snapshot, provisioning the default record on
    /// first use.
    async fn load_or_provision(&self, account_id: Uuid) -> Result<AccountView, AppError>;

    /// Authoritatively charge `amount` credits. The server re-reads the
    /// balance; a stale snapshot on the caller side never over-commits.
    async fn charge(&self, account_id: Uuid, amount: i32) -> Result<ChargeOutcome, AppError>;
}

#[derive(Debug, Serialize)]
struct ChargeRequest {
    amount: i32,
}

/// HTTP implementation of [`CreditsApi`] against the credits service.
#[derive(Clone)]
pub struct CreditsClient {
    client: reqwest::Client,
    base_url: String,
}

impl CreditsClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn account_url(&self, account_id: Uuid) -> String {
        format!("{}/accounts/{}", self.base_url, account_id)
    }
}

#[async_trait]
impl CreditsApi for CreditsClient {
    async fn load_or_provision(&self, account_id: Uuid) -> Result<AccountView, AppError> {
        let response = self
            .client
            .get(self.account_url(account_id))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(account_id = %account_id, error = %e, "Credits lookup failed");
                AppError::CreditsUnavailable
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // First use: provision the default record instead of erroring.
            tracing::info!(account_id = %account_id, "Provisioning default credit account");
            let response = self
                .client
                .post(self.account_url(account_id))
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(account_id = %account_id, error = %e, "Credits provisioning failed");
                    AppError::CreditsUnavailable
                })?;

            if !response.status().is_success() {
                tracing::error!(
                    account_id = %account_id,
                    status = %response.status(),
                    "Credits provisioning returned an error status"
                );
                return Err(AppError::CreditsUnavailable);
            }

            return response
                .json::<AccountView>()
                .await
                .map_err(|_| AppError::CreditsUnavailable);
        }

        if !response.status().is_success() {
            tracing::error!(
                account_id = %account_id,
                status = %response.status(),
                "Credits lookup returned an error status"
            );
            return Err(AppError::CreditsUnavailable);
        }

        response
            .json::<AccountView>()
            .await
            .map_err(|_| AppError::CreditsUnavailable)
    }

    async fn charge(&self, account_id: Uuid, amount: i32) -> Result<ChargeOutcome, AppError> {
        let response = self
            .client
            .post(format!("{}/charge", self.account_url(account_id)))
            .json(&ChargeRequest { amount })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(account_id = %account_id, error = %e, "Credits charge failed");
                AppError::CreditsUnavailable
            })?;

        if !response.status().is_success() {
            tracing::error!(
                account_id = %account_id,
                status = %response.status(),
                "Credits charge returned an error status"
            );
            return Err(AppError::CreditsUnavailable);
        }

        response
            .json::<ChargeOutcome>()
            .await
            .map_err(|_| AppError::CreditsUnavailable)
    }
}
