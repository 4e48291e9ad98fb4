//! Mentor Q&A handlers.
//!
//! Every question is one metered action: balance check, relay round
//! trip, then the charge. Conversation continuation replays stored
//! history into the transcript and persists the new turns afterwards.

use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::middleware::account::AccountContext;
use validator::Validate;

use crate::{
    dtos::{AskRequest, AskResponse},
    models::{Conversation, ConversationMessage},
    services::model_catalog,
    services::providers::{ChatOutcome, ChatRequest, ChatTurn, Role},
    startup::AppState,
};

pub async fn ask(
    State(state): State<AppState>,
    account: AccountContext,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    payload.validate()?;
    payload.check_shape()?;

    let resolved = model_catalog::resolve(payload.model.as_deref());

    // Load the conversation first so a bad conversation_id fails before
    // any credit is at stake.
    let conversation = match &payload.conversation_id {
        Some(id) => Some(
            state
                .db
                .find_conversation(id, &account.account_id.to_string())
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("No such conversation for this account"))
                })?,
        ),
        None => None,
    };

    let (turns, user_message) = build_transcript(&payload, &resolved, conversation.as_ref())?;

    let request = ChatRequest {
        model: resolved.model_id.clone(),
        turns,
        tool: None,
    };

    let metered = state
        .gate
        .execute(account.account_id, "ask", &request)
        .await?;

    let reply = match metered.outcome {
        ChatOutcome::Text(text) => text,
        // No tool was requested; a structured payload here is relay
        // noise, so serve it verbatim rather than dropping the answer.
        ChatOutcome::Structured(value) => value.to_string(),
    };

    let conversation_id = persist_turns(
        &state,
        &account,
        &resolved.model_id,
        conversation,
        user_message,
        &reply,
    )
    .await?;

    Ok(Json(AskResponse {
        reply,
        conversation_id,
        credits_remaining: metered.account.remaining_credits,
    }))
}

/// Assemble the relay transcript. Returns the turns plus the user
/// message to persist (None in raw-transcript mode, which is stateless).
fn build_transcript(
    payload: &AskRequest,
    resolved: &model_catalog::ResolvedModel,
    conversation: Option<&Conversation>,
) -> Result<(Vec<ChatTurn>, Option<String>), AppError> {
    if let Some(messages) = &payload.messages {
        // Full-transcript mode: forward as given, trusting the caller's
        // roles. Unknown roles are a caller error.
        let turns = messages
            .iter()
            .map(|turn| {
                let role = match turn.role.as_str() {
                    "system" => Role::System,
                    "user" => Role::User,
                    "assistant" => Role::Assistant,
                    other => {
                        return Err(AppError::BadRequest(anyhow::anyhow!(
                            "Unknown message role: {}",
                            other
                        )))
                    }
                };
                Ok(ChatTurn {
                    role,
                    content: turn.content.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok((turns, None));
    }

    let message = payload
        .message
        .clone()
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("message is required")))?;

    let mut turns = vec![ChatTurn::system(resolved.system_prompt)];
    if let Some(conversation) = conversation {
        for prior in &conversation.messages {
            let role = if prior.role == "assistant" {
                Role::Assistant
            } else {
                Role::User
            };
            turns.push(ChatTurn {
                role,
                content: prior.content.clone(),
            });
        }
    }
    turns.push(ChatTurn::user(message.clone()));

    Ok((turns, Some(message)))
}

/// Persist the question/answer pair, creating the conversation on first
/// use. Raw-transcript requests are not persisted.
async fn persist_turns(
    state: &AppState,
    account: &AccountContext,
    model_id: &str,
    conversation: Option<Conversation>,
    user_message: Option<String>,
    reply: &str,
) -> Result<Option<String>, AppError> {
    let Some(user_message) = user_message else {
        return Ok(None);
    };

    match conversation {
        Some(conversation) => {
            let now = chrono::Utc::now();
            let turns = [
                ConversationMessage {
                    role: "user".to_string(),
                    content: user_message,
                    timestamp: now,
                },
                ConversationMessage {
                    role: "assistant".to_string(),
                    content: reply.to_string(),
                    timestamp: now,
                },
            ];
            state
                .db
                .append_turns(&conversation.conversation_id, &turns)
                .await?;
            Ok(Some(conversation.conversation_id))
        }
        None => {
            let mut conversation =
                Conversation::new(account.account_id.to_string(), model_id.to_string());
            conversation.add_message("user".to_string(), user_message);
            conversation.add_message("assistant".to_string(), reply.to_string());
            state.db.insert_conversation(&conversation).await?;
            Ok(Some(conversation.conversation_id))
        }
    }
}
