//! Mock chat provider.
//!
//! Stands in for the relay when no API key is configured, and backs the
//! metering tests. Text requests echo the last user turn; forced tool
//! calls answer with an empty but well-formed ranking.

use super::{ChatOutcome, ChatProvider, ChatRequest, ProviderError, Role};
use async_trait::async_trait;

pub struct MockChatProvider {
    enabled: bool,
}

impl MockChatProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatOutcome, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock chat provider not enabled".to_string(),
            ));
        }

        if request.tool.is_some() {
            return Ok(ChatOutcome::Structured(serde_json::json!({
                "matches": [],
                "explanation": "Mock ranking: no relay configured"
            })));
        }

        let last_user = request
            .turns
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .map(|turn| turn.content.as_str())
            .unwrap_or("(empty)");

        Ok(ChatOutcome::Text(format!(
            "Mock mentor response for: {}",
            last_user
        )))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock chat provider not enabled".to_string(),
            ))
        }
    }
}
