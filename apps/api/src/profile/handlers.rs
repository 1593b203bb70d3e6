use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::models::profile::{ProfilePatch, UserProfile};
use crate::prompting::formatter::format_profile;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FormattedText {
    pub text: String,
}

/// GET /api/v1/user-profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<UserProfile>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(session.profile.profile().clone()))
}

/// PUT /api/v1/user-profile
/// Accepts any subset of the profile fields.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<UserProfile>, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    let profile = session.profile.update(patch).await?.clone();
    Ok(Json(profile))
}

/// POST /api/v1/user-profile/reset
pub async fn handle_reset_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<UserProfile>, AppError> {
    let handle = state.session(user_id).await?;
    let mut session = handle.lock().await;
    let profile = session.profile.reset().await?.clone();
    Ok(Json(profile))
}

/// GET /api/v1/user-profile/formatted
pub async fn handle_formatted_profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<FormattedText>, AppError> {
    let handle = state.session(user_id).await?;
    let session = handle.lock().await;
    Ok(Json(FormattedText {
        text: format_profile(session.profile.profile()),
    }))
}
