//! Grow assistant chat endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::services::ChatError;
use crate::services::chat::{IncomingMessage, prepare_history, validate_messages};
use crate::state::AppState;

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<IncomingMessage>,
}

/// Chat response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Answer the latest message of a conversation.
#[instrument(skip(state, request), fields(messages = request.messages.len()))]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let client = state.chat().ok_or(ChatError::NotConfigured)?;
    let history = prepare_history(validate_messages(request.messages)?)?;
    let reply = client.reply(&history).await?;
    Ok(Json(ChatResponse { reply }))
}
