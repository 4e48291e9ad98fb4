//! HTTPS chat relay provider.
//!
//! Speaks the OpenAI-compatible `/chat/completions` wire format against
//! the configured relay endpoint. Classification of upstream failures is
//! strict: 429 means rate limited, 402 means the relay account needs
//! payment, any other non-2xx is an upstream failure, and a 2xx body
//! without `choices[0].message` is malformed. The client never retries;
//! one call in, at most one request out.

use super::{ChatOutcome, ChatProvider, ChatRequest, ProviderError, ToolSpec};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Upstream error bodies are logged truncated to this length.
const ERROR_BODY_LIMIT: usize = 512;

/// Chat relay provider configuration.
#[derive(Clone)]
pub struct RelayConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub timeout_secs: u64,
}

/// Chat relay provider.
pub struct RelayChatProvider {
    config: RelayConfig,
    client: Client,
}

impl RelayChatProvider {
    pub fn new(config: RelayConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request(&self, request: &ChatRequest) -> CompletionRequest {
        let messages = request
            .turns
            .iter()
            .map(|turn| WireMessage {
                role: turn.role.as_str().to_string(),
                content: Some(turn.content.clone()),
                tool_calls: None,
            })
            .collect();

        let (tools, tool_choice) = match &request.tool {
            Some(tool) => (
                Some(vec![WireTool::from(tool)]),
                Some(ToolChoice::function(&tool.name)),
            ),
            None => (None, None),
        };

        CompletionRequest {
            model: request.model.clone(),
            messages,
            tools,
            tool_choice,
        }
    }

    /// Interpret the assistant message per the relay contract.
    fn extract_outcome(
        message: WireMessage,
        tool_required: bool,
    ) -> Result<ChatOutcome, ProviderError> {
        if let Some(call) = message
            .tool_calls
            .as_ref()
            .and_then(|calls| calls.first())
        {
            // Arguments that fail to parse as JSON are tolerated as raw
            // text so a flaky relay degrades instead of erroring.
            return match serde_json::from_str(&call.function.arguments) {
                Ok(value) => Ok(ChatOutcome::Structured(value)),
                Err(e) => {
                    tracing::warn!(
                        tool = %call.function.name,
                        error = %e,
                        "Tool call arguments were not valid JSON, degrading to text"
                    );
                    Ok(ChatOutcome::Text(call.function.arguments.clone()))
                }
            };
        }

        if tool_required {
            return Err(ProviderError::Malformed(
                "Relay ignored the forced tool call".to_string(),
            ));
        }

        match message.content {
            Some(text) => Ok(ChatOutcome::Text(text)),
            None => Err(ProviderError::Malformed(
                "Assistant message had neither content nor tool calls".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ChatProvider for RelayChatProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatOutcome, ProviderError> {
        let wire_request = self.build_request(request);

        tracing::debug!(
            model = %request.model,
            turns = request.turns.len(),
            forced_tool = request.tool.is_some(),
            "Sending request to chat relay"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| ProviderError::Upstream {
                status: None,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(ERROR_BODY_LIMIT);

            return Err(match status.as_u16() {
                429 => ProviderError::RateLimited,
                402 => ProviderError::PaymentRequired,
                code => {
                    tracing::error!(status = code, body = %body, "Chat relay returned an error");
                    ProviderError::Upstream {
                        status: Some(code),
                        detail: body,
                    }
                }
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse response: {}", e)))?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| {
                ProviderError::Malformed("Response carried no choices".to_string())
            })?;

        Self::extract_outcome(message, request.tool.is_some())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Relay API key not configured".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Relay Wire Types (OpenAI-compatible)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

impl From<&ToolSpec> for WireTool {
    fn from(tool: &ToolSpec) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolChoiceFunction,
}

impl ToolChoice {
    fn function(name: &str) -> Self {
        Self {
            kind: "function",
            function: ToolChoiceFunction {
                name: name.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ToolChoiceFunction {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireCalledFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCalledFunction {
    name: String,
    arguments: String,
}
