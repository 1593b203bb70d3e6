//! Persistence gateway: per-user CRUD behind one trait.
//!
//! Two backends implement it: PostgreSQL (`postgres`) and flat JSON files
//! partitioned per user (`file`). Callers only ever see `Arc<dyn PersistenceGateway>`.

pub mod file;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::marketing::{MarketingPlan, MarketingPrompt, NewMarketingPrompt};
use crate::models::profile::UserProfile;
use crate::models::prompt::PromptVersion;
use crate::models::user::{NewUser, User};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// CRUD surface the core consumes. Every list is returned newest-first.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Most recently updated profile for the user, if any.
    async fn latest_profile(&self, user_id: Uuid) -> PersistenceResult<Option<UserProfile>>;

    /// Updates the user's profile if one exists, else creates it.
    async fn upsert_profile(&self, user_id: Uuid, profile: &UserProfile) -> PersistenceResult<()>;

    async fn list_prompt_versions(&self, user_id: Uuid) -> PersistenceResult<Vec<PromptVersion>>;

    /// Inserts a new version. When `is_active` is set, every other version of
    /// the user is deactivated first.
    async fn create_prompt_version(
        &self,
        user_id: Uuid,
        prompt: &str,
        is_active: bool,
    ) -> PersistenceResult<PromptVersion>;

    /// Deletes one version owned by `user_id`. `NotFound` if it is not theirs.
    async fn delete_prompt_version(&self, user_id: Uuid, id: Uuid) -> PersistenceResult<()>;

    async fn list_marketing_prompts(&self, user_id: Uuid)
        -> PersistenceResult<Vec<MarketingPrompt>>;

    /// Inserts a marketing prompt, deactivating the previous active one when
    /// the new one is active.
    async fn create_marketing_prompt(
        &self,
        user_id: Uuid,
        new: NewMarketingPrompt,
    ) -> PersistenceResult<MarketingPrompt>;

    /// Removes every marketing prompt of the user, returning how many went.
    async fn delete_marketing_prompts(&self, user_id: Uuid) -> PersistenceResult<u64>;

    async fn list_marketing_plans(&self, user_id: Uuid) -> PersistenceResult<Vec<MarketingPlan>>;

    async fn add_marketing_plan(&self, user_id: Uuid, plan: &MarketingPlan)
        -> PersistenceResult<()>;

    async fn clear_marketing_plans(&self, user_id: Uuid) -> PersistenceResult<()>;

    /// `Conflict` if the email is already registered.
    async fn create_user(&self, new: NewUser) -> PersistenceResult<User>;

    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> PersistenceResult<Option<User>>;

    /// Deletes the account and everything stored for it.
    async fn delete_user(&self, id: Uuid) -> PersistenceResult<()>;
}

/// Storage shape of a marketing prompt: the two list fields are kept as
/// serialized JSON text and only turned back into lists on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MarketingPromptRecord {
    pub id: Uuid,
    pub prompt: String,
    pub best_products: Option<String>,
    pub marketing_technique: String,
    pub conversation_starter: String,
    pub conversation_sequence: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarketingPromptRecord {
    pub fn from_new(new: NewMarketingPrompt) -> PersistenceResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            prompt: new.prompt,
            best_products: Some(serde_json::to_string(&new.best_products)?),
            marketing_technique: new.marketing_technique,
            conversation_starter: new.conversation_starter,
            conversation_sequence: Some(serde_json::to_string(&new.conversation_sequence)?),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn into_prompt(self) -> MarketingPrompt {
        MarketingPrompt {
            best_products: decode_list(self.id, "bestProducts", self.best_products.as_deref()),
            conversation_sequence: decode_list(
                self.id,
                "conversationSequence",
                self.conversation_sequence.as_deref(),
            ),
            id: self.id,
            prompt: self.prompt,
            marketing_technique: self.marketing_technique,
            conversation_starter: self.conversation_starter,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Deserializes a stored list column. Missing or corrupt text reads as empty.
fn decode_list(id: Uuid, field: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!("Marketing prompt {id}: unreadable {field} ({e}); treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trips_list_fields() {
        let record = MarketingPromptRecord::from_new(NewMarketingPrompt {
            prompt: "p".into(),
            best_products: vec!["DANA+".into(), "eMAS".into()],
            conversation_sequence: vec!["Ask".into(), "Listen".into()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(record.best_products.as_deref(), Some(r#"["DANA+","eMAS"]"#));

        let prompt = record.into_prompt();
        assert_eq!(prompt.best_products, vec!["DANA+", "eMAS"]);
        assert_eq!(prompt.conversation_sequence, vec!["Ask", "Listen"]);
    }

    #[test]
    fn test_corrupt_list_text_reads_as_empty() {
        let mut record = MarketingPromptRecord::from_new(NewMarketingPrompt::default()).unwrap();
        record.best_products = Some("not json".into());
        record.conversation_sequence = None;
        let prompt = record.into_prompt();
        assert!(prompt.best_products.is_empty());
        assert!(prompt.conversation_sequence.is_empty());
    }
}
