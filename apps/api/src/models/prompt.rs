use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One saved revision of a user's final (system) prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersion {
    pub id: Uuid,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}
