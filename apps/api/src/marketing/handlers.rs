use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::marketing::baseline::baseline_plan;
use crate::marketing::generator::generate_plan;
use crate::models::marketing::{MarketingPlan, MarketingPrompt, NewMarketingPrompt};
use crate::state::AppState;

#[derive(Serialize, Deserialize)]
pub struct MarketingPromptText {
    pub prompt: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct GenerateRequest {
    /// Replaces the current marketing prompt before generating.
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Serialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

// ── Marketing plans ─────────────────────────────────────────────────────────

/// GET /api/v1/marketing-plans/prompt
pub async fn handle_get_marketing_prompt(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<MarketingPromptText>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(MarketingPromptText {
        prompt: session.marketing.current_prompt().to_string(),
    }))
}

/// PUT /api/v1/marketing-plans/prompt
pub async fn handle_set_marketing_prompt(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(req): Json<MarketingPromptText>,
) -> Result<Json<MarketingPromptText>, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    session.marketing.set_current_prompt(req.prompt);
    Ok(Json(MarketingPromptText {
        prompt: session.marketing.current_prompt().to_string(),
    }))
}

/// GET /api/v1/marketing-plans
pub async fn handle_list_plans(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<MarketingPlan>>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(session.marketing.plans().to_vec()))
}

/// DELETE /api/v1/marketing-plans
pub async fn handle_clear_plans(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<StatusCode, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    session.marketing.clear_plans().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/marketing-plans/generate
/// Body is optional; `{"prompt": "..."}` overrides the current marketing prompt.
/// A body that is present but not valid JSON is rejected.
pub async fn handle_generate_plan(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    body: Bytes,
) -> Result<(StatusCode, Json<MarketingPlan>), AppError> {
    let req = parse_generate_request(&body)?;
    let knowledge_base = state.knowledge.read().await.knowledge_base().clone();

    let handle = state.session(user_id).await?;
    let (prompt_text, profile) = {
        let mut session = handle.lock().await;
        if let Some(prompt) = req.prompt {
            session.marketing.set_current_prompt(prompt);
        }
        (
            session.marketing.current_prompt().to_string(),
            session.profile.profile().clone(),
        )
    };

    let plan = generate_plan(state.llm.as_ref(), &prompt_text, &profile, &knowledge_base).await?;

    let mut session = handle.lock().await;
    let stored = session.marketing.add_plan(plan).await?.clone();
    Ok((StatusCode::CREATED, Json(stored)))
}

fn parse_generate_request(body: &[u8]) -> Result<GenerateRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid generate request body: {e}")))
}

/// GET /api/v1/marketing-plans/baseline
/// Rule-based plan for the current profile. Not stored.
pub async fn handle_baseline_plan(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<MarketingPlan>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(baseline_plan(session.profile.profile())))
}

// ── Saved marketing prompts ─────────────────────────────────────────────────

/// GET /api/v1/marketing-prompts
pub async fn handle_list_marketing_prompts(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<Vec<MarketingPrompt>>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(session.marketing.saved_prompts().await?))
}

/// POST /api/v1/marketing-prompts
pub async fn handle_create_marketing_prompt(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(req): Json<NewMarketingPrompt>,
) -> Result<(StatusCode, Json<MarketingPrompt>), AppError> {
    if req.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".to_string()));
    }
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    let created = session.marketing.save_prompt(req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/v1/marketing-prompts
pub async fn handle_delete_marketing_prompts(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<DeletedCount>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    let deleted = session.marketing.delete_saved_prompts().await?;
    Ok(Json(DeletedCount { deleted }))
}
