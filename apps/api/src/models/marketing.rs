use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::profile::UserProfile;

/// Structured recommendation bundle derived from a user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingPlan {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub best_products: Vec<String>,
    pub marketing_technique: String,
    pub conversation_starter: String,
    pub conversation_sequence: Vec<String>,
    /// Profile the plan was generated for.
    pub user_profile: UserProfile,
}

/// A marketing prompt saved together with the plan it produced.
/// At most one per user is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingPrompt {
    pub id: Uuid,
    pub prompt: String,
    pub best_products: Vec<String>,
    pub marketing_technique: String,
    pub conversation_starter: String,
    pub conversation_sequence: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarketingPrompt {
    pub prompt: String,
    #[serde(default)]
    pub best_products: Vec<String>,
    #[serde(default)]
    pub marketing_technique: String,
    #[serde(default)]
    pub conversation_starter: String,
    #[serde(default)]
    pub conversation_sequence: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}
