use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::models::knowledge::{KnowledgeBase, ProductInfo, ProductKey, ProductPatch};
use crate::profile::handlers::FormattedText;
use crate::prompting::formatter::format_knowledge_base;
use crate::state::AppState;

/// GET /api/v1/knowledge-base
pub async fn handle_get_knowledge_base(
    State(state): State<AppState>,
    _user: SessionUser,
) -> Json<KnowledgeBase> {
    Json(state.knowledge.read().await.knowledge_base().clone())
}

/// PATCH /api/v1/knowledge-base/:product
/// `product` is one of `danaPlus`, `reksadana`, `eMAS` (any case).
pub async fn handle_update_product(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Path(product): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductInfo>, AppError> {
    let key = ProductKey::from_key(&product)
        .ok_or_else(|| AppError::NotFound(format!("Product '{product}'")))?;
    let mut knowledge = state.knowledge.write().await;
    let updated = knowledge.update_product(key, patch).clone();
    tracing::info!("User {user_id} edited {}", key.label());
    Ok(Json(updated))
}

/// POST /api/v1/knowledge-base/reset
pub async fn handle_reset_knowledge_base(
    State(state): State<AppState>,
    _user: SessionUser,
) -> Json<KnowledgeBase> {
    Json(state.knowledge.write().await.reset().clone())
}

/// GET /api/v1/knowledge-base/formatted
pub async fn handle_formatted_knowledge_base(
    State(state): State<AppState>,
    _user: SessionUser,
) -> Json<FormattedText> {
    let knowledge = state.knowledge.read().await;
    Json(FormattedText {
        text: format_knowledge_base(knowledge.knowledge_base()),
    })
}
