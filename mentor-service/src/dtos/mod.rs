use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::JobMatch;

/// A caller-supplied chat turn for multi-turn mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDto {
    pub role: String,
    pub content: String,
}

/// Mentor question. Exactly one of `message` (single-question mode) or
/// `messages` (full transcript mode) must be present.
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 8000, message = "message must not be empty"))]
    pub message: Option<String>,

    pub messages: Option<Vec<TurnDto>>,

    /// Model alias or raw provider model id.
    pub model: Option<String>,

    /// Continue an existing conversation.
    pub conversation_id: Option<String>,
}

impl AskRequest {
    /// Enforce the message-xor-messages shape on top of derive checks.
    pub fn check_shape(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let add = |errors: &mut ValidationErrors, field, code, message: &'static str| {
            let mut error = ValidationError::new(code);
            error.message = Some(message.into());
            errors.add(field, error);
        };

        match (&self.message, &self.messages) {
            (None, None) => add(
                &mut errors,
                "message",
                "missing",
                "either message or messages is required",
            ),
            (Some(_), Some(_)) => add(
                &mut errors,
                "message",
                "conflict",
                "message and messages are mutually exclusive",
            ),
            (None, Some(turns)) if turns.is_empty() => add(
                &mut errors,
                "messages",
                "empty",
                "messages must not be empty",
            ),
            _ => {}
        }

        // Transcript mode is stateless; stored-conversation continuation
        // only exists in single-message mode.
        if self.messages.is_some() && self.conversation_id.is_some() {
            add(
                &mut errors,
                "conversation_id",
                "conflict",
                "conversation_id cannot be combined with a full transcript",
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub credits_remaining: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JobMatchRequest {
    #[validate(length(min = 1, max = 4000, message = "query must not be empty"))]
    pub query: String,

    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobMatchResponse {
    pub results: Vec<JobMatch>,
    pub explanation: String,
    pub total_analyzed: usize,
    pub credits_remaining: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 200))]
    pub company: String,

    pub location: Option<String>,

    #[validate(length(min = 1, max = 20000))]
    pub description: String,

    #[serde(default)]
    pub skills: Vec<String>,
}
