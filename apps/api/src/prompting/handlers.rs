use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::models::prompt::PromptVersion;
use crate::profile::handlers::FormattedText;
use crate::prompting::final_prompt::FinalPromptManager;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalPromptResponse {
    pub final_prompt: String,
    pub active_version_id: Option<Uuid>,
}

impl From<&FinalPromptManager> for FinalPromptResponse {
    fn from(manager: &FinalPromptManager) -> Self {
        Self {
            final_prompt: manager.final_prompt().to_string(),
            active_version_id: manager.active_version_id(),
        }
    }
}

#[derive(Deserialize)]
pub struct SetPromptRequest {
    pub prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionListResponse {
    pub versions: Vec<PromptVersion>,
    pub active_version_id: Option<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadVersionResponse {
    /// False when the id is not in the user's history; nothing changed then.
    pub loaded: bool,
    #[serde(flatten)]
    pub current: FinalPromptResponse,
}

/// GET /api/v1/final-prompt
pub async fn handle_get_final_prompt(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<FinalPromptResponse>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(FinalPromptResponse::from(&session.prompts)))
}

/// PUT /api/v1/final-prompt
/// Edits the working prompt only; POST /versions persists it.
pub async fn handle_set_final_prompt(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(req): Json<SetPromptRequest>,
) -> Result<Json<FinalPromptResponse>, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    session.prompts.set_final_prompt(req.prompt);
    Ok(Json(FinalPromptResponse::from(&session.prompts)))
}

/// GET /api/v1/final-prompt/preview
pub async fn handle_preview_final_prompt(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<FormattedText>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    let knowledge = state.knowledge.read().await;
    Ok(Json(FormattedText {
        text: session
            .prompts
            .full_prompt_with_context(knowledge.knowledge_base()),
    }))
}

/// GET /api/v1/final-prompt/versions
pub async fn handle_list_versions(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<VersionListResponse>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(VersionListResponse {
        versions: session.prompts.versions().to_vec(),
        active_version_id: session.prompts.active_version_id(),
    }))
}

/// POST /api/v1/final-prompt/versions
pub async fn handle_save_version(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<(StatusCode, Json<PromptVersion>), AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    let version = session.prompts.save_version().await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// POST /api/v1/final-prompt/versions/:id/load
pub async fn handle_load_version(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LoadVersionResponse>, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    let loaded = session.prompts.load_version(id);
    Ok(Json(LoadVersionResponse {
        loaded,
        current: FinalPromptResponse::from(&session.prompts),
    }))
}

/// DELETE /api/v1/final-prompt/versions/:id
pub async fn handle_delete_version(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    session.prompts.delete_version(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
