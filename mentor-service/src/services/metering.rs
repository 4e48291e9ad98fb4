//! Credit-metered access to the chat relay.
//!
//! Every AI action goes through [`MeteredChat`], which enforces one
//! ordering: verify the balance, call the provider, then charge. The
//! charge happens only after the provider has answered; a provider
//! failure must never cost the student a credit. When the ledger itself
//! cannot be reached the action is refused outright.

use crate::services::metrics::{record_action, RELAY_DURATION};
use crate::services::providers::{ChatOutcome, ChatProvider, ChatRequest, ProviderError};
use service_core::clients::{AccountView, CreditsApi};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// Cost of a single AI action.
pub const ACTION_COST: i32 = 1;

/// Result of a metered action: the provider outcome plus the balance
/// left after the charge.
pub struct MeteredOutcome {
    pub outcome: ChatOutcome,
    pub account: AccountView,
}

#[derive(Clone)]
pub struct MeteredChat {
    credits: Arc<dyn CreditsApi>,
    provider: Arc<dyn ChatProvider>,
}

impl MeteredChat {
    pub fn new(credits: Arc<dyn CreditsApi>, provider: Arc<dyn ChatProvider>) -> Self {
        Self { credits, provider }
    }

    /// Run one metered relay round trip for the given account.
    pub async fn execute(
        &self,
        account_id: Uuid,
        action: &str,
        request: &ChatRequest,
    ) -> Result<MeteredOutcome, AppError> {
        let snapshot = self.credits.load_or_provision(account_id).await?;

        // Advisory pre-check over the snapshot: refuse up front rather
        // than burn a provider call the charge would refuse anyway.
        if !snapshot.can_afford(ACTION_COST) {
            tracing::info!(
                account_id = %account_id,
                remaining = snapshot.remaining_credits,
                action,
                "Refusing metered action: insufficient credits"
            );
            record_action(action, "insufficient");
            return Err(AppError::InsufficientCredits);
        }

        let started = std::time::Instant::now();
        let result = self.provider.chat(request).await;
        let label = if result.is_ok() { "ok" } else { "error" };
        RELAY_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                record_action(action, "provider_error");
                return Err(map_provider_error(e));
            }
        };

        // Authoritative charge, after provider success only. The server
        // re-checks the balance; a race since the snapshot read surfaces
        // here as committed == false.
        let charge = self.credits.charge(account_id, ACTION_COST).await?;
        if !charge.committed {
            record_action(action, "insufficient");
            return Err(AppError::InsufficientCredits);
        }

        record_action(action, "completed");
        Ok(MeteredOutcome {
            outcome,
            account: charge.account,
        })
    }
}

/// Map provider failures onto the caller-facing error taxonomy.
pub fn map_provider_error(error: ProviderError) -> AppError {
    match error {
        ProviderError::RateLimited => AppError::TooManyRequests(
            "The AI service is receiving too many requests - try again shortly".to_string(),
            Some(30),
        ),
        ProviderError::PaymentRequired => AppError::PaymentRequired(
            "The AI service refused the request for billing reasons".to_string(),
        ),
        ProviderError::Upstream { status, detail } => {
            tracing::error!(?status, detail = %detail, "Chat relay failure");
            AppError::BadGateway(detail)
        }
        ProviderError::Malformed(detail) => {
            tracing::error!(detail = %detail, "Chat relay returned a malformed response");
            AppError::BadGateway(detail)
        }
        ProviderError::NotConfigured(detail) => {
            tracing::error!(detail = %detail, "Chat provider not configured");
            AppError::ServiceUnavailable
        }
    }
}
