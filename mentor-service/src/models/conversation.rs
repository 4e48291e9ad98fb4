//! Conversation model for multi-turn mentoring context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A mentoring conversation that maintains context across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub conversation_id: String,

    /// Account that owns this conversation.
    pub account_id: String,

    /// Model alias the conversation was started with.
    pub model: String,

    /// Messages in this conversation, oldest first.
    pub messages: Vec<ConversationMessage>,

    /// Total number of messages.
    pub message_count: i32,

    /// When the conversation was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// When the conversation was last updated.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Role: "user" or "assistant".
    pub role: String,

    /// Message content.
    pub content: String,

    /// When the message was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Conversation {
    pub fn new(account_id: String, model: String) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            account_id,
            model,
            messages: Vec::new(),
            message_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn to the in-memory conversation.
    pub fn add_message(&mut self, role: String, content: String) {
        self.messages.push(ConversationMessage {
            role,
            content,
            timestamp: Utc::now(),
        });
        self.message_count = self.messages.len() as i32;
        self.updated_at = Utc::now();
    }
}
