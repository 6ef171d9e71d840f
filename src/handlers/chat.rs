//! Chat endpoint: validates the message and proxies it to the hosted
//! assistant, keeping the thread id with the client between turns.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

const MAX_MESSAGE_LEN: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    pub message: Option<String>,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> AppResult<Json<Value>> {
    let message = req
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Message is required".to_string()))?;

    if message.len() > MAX_MESSAGE_LEN {
        return Err(AppError::BadRequest(format!(
            "Message is too long (max {} characters)",
            MAX_MESSAGE_LEN
        )));
    }

    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| AppError::Internal("Server configuration error".to_string()))?;

    let (thread_id, response) = assistant.send_message(req.thread_id, &message).await?;

    Ok(Json(json!({
        "threadId": thread_id,
        "response": response,
    })))
}
