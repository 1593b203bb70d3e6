use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::llm_client::CompletionService;
use crate::models::chat::ChatMessage;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLogResponse {
    pub messages: Vec<ChatMessage>,
    pub is_busy: bool,
}

/// GET /api/v1/chat/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<ChatLogResponse>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(ChatLogResponse {
        messages: session.chat.messages().to_vec(),
        is_busy: session.chat.is_busy(),
    }))
}

/// POST /api/v1/chat/messages
/// Always answers 200 once the message is accepted; an upstream failure shows
/// up as the apology reply. The session is unlocked while the completion runs.
pub async fn handle_send_message(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    let text = req.message.trim();
    if text.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }
    let knowledge_base = state.knowledge.read().await.knowledge_base().clone();

    let handle = state.session(user_id).await?;
    let turn = {
        let mut guard = handle.lock().await;
        let session = &mut *guard;
        session.chat.begin_turn(
            session.prompts.final_prompt(),
            session.profile.profile(),
            &knowledge_base,
            text,
        )
    };

    let outcome = state.llm.complete(&turn.request).await;

    let reply = handle.lock().await.chat.finish_turn(turn, outcome);
    Ok(Json(reply))
}

/// DELETE /api/v1/chat/messages
pub async fn handle_clear_messages(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<StatusCode, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    session.chat.clear_messages();
    Ok(StatusCode::NO_CONTENT)
}
