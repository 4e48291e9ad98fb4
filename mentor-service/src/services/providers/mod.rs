//! AI relay provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction over the chat relay,
//! allowing the real HTTPS client and a mock to be swapped behind one
//! seam.

pub mod mock;
pub mod relay;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
///
/// Each variant maps to a distinct caller-facing outcome; see the
/// `From<ProviderError> for AppError` impl in the handlers module.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Payment required upstream")]
    PaymentRequired,

    #[error("Upstream failure: {detail}")]
    Upstream {
        /// HTTP status when the relay answered; `None` for transport
        /// errors and timeouts.
        status: Option<u16>,
        detail: String,
    },

    #[error("Malformed relay response: {0}")]
    Malformed(String),
}

/// A single turn in the chat transcript sent to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A tool the relay is forced to call for structured output.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool arguments.
    pub parameters: serde_json::Value,
}

/// A fully resolved request for one relay round trip.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Concrete provider model id, already resolved from any alias.
    pub model: String,
    pub turns: Vec<ChatTurn>,
    /// When set, the wire request pins `tool_choice` to this function.
    pub tool: Option<ToolSpec>,
}

/// Outcome of one relay round trip. Tagged; never partially populated.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    /// Plain assistant text.
    Text(String),
    /// Parsed arguments of the forced tool call.
    Structured(serde_json::Value),
}

/// Trait for chat relay providers.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Perform one chat round trip. No retries; one request maps to at
    /// most one upstream call.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatOutcome, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
