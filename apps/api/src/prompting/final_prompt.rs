//! Final prompt management: the working system prompt, its saved versions,
//! and which version is active.
//!
//! Versions are kept newest-first. Saving goes through the persistence gateway
//! (which deactivates the user's other versions before inserting) and only then
//! touches local history, so a failed save leaves history as it was.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::models::knowledge::KnowledgeBase;
use crate::models::prompt::PromptVersion;
use crate::persistence::{PersistenceGateway, PersistenceResult};
use crate::prompting::formatter::format_knowledge_base;
use crate::prompting::prompts::{DEFAULT_FINAL_PROMPT, KNOWLEDGE_BASE_SECTION, PROFILE_PLACEHOLDER};

pub struct FinalPromptManager {
    user_id: Uuid,
    gateway: Arc<dyn PersistenceGateway>,
    final_prompt: String,
    versions: Vec<PromptVersion>,
    active_version_id: Option<Uuid>,
}

impl FinalPromptManager {
    /// Empty history with the built-in default prompt.
    pub fn new(user_id: Uuid, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            user_id,
            gateway,
            final_prompt: DEFAULT_FINAL_PROMPT.to_string(),
            versions: Vec::new(),
            active_version_id: None,
        }
    }

    /// Restores persisted history. The working prompt becomes the active
    /// version, else the newest one, else the default prompt.
    pub async fn load(
        user_id: Uuid,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> PersistenceResult<Self> {
        let versions = gateway.list_prompt_versions(user_id).await?;
        let mut manager = Self::new(user_id, gateway);

        let current = versions
            .iter()
            .find(|v| v.is_active)
            .or_else(|| versions.first());
        if let Some(current) = current {
            manager.final_prompt = current.prompt.clone();
            manager.active_version_id = Some(current.id);
        }
        info!(
            "Loaded {} prompt versions for user {user_id}",
            versions.len()
        );
        manager.versions = versions;
        Ok(manager)
    }

    pub fn final_prompt(&self) -> &str {
        &self.final_prompt
    }

    pub fn versions(&self) -> &[PromptVersion] {
        &self.versions
    }

    pub fn active_version_id(&self) -> Option<Uuid> {
        self.active_version_id
    }

    /// Replaces the working prompt. Nothing is persisted.
    pub fn set_final_prompt(&mut self, text: impl Into<String>) {
        self.final_prompt = text.into();
    }

    /// Persists the working prompt as a new active version.
    pub async fn save_version(&mut self) -> PersistenceResult<PromptVersion> {
        let version = match self
            .gateway
            .create_prompt_version(self.user_id, &self.final_prompt, true)
            .await
        {
            Ok(version) => version,
            Err(e) => {
                error!("Failed to save prompt version for user {}: {e}", self.user_id);
                return Err(e);
            }
        };

        for existing in &mut self.versions {
            existing.is_active = false;
        }
        self.versions.insert(0, version.clone());
        self.active_version_id = Some(version.id);
        Ok(version)
    }

    /// Makes a known version the working prompt. Unknown ids are a no-op.
    pub fn load_version(&mut self, id: Uuid) -> bool {
        let Some(version) = self.versions.iter().find(|v| v.id == id) else {
            return false;
        };
        self.final_prompt = version.prompt.clone();
        self.active_version_id = Some(id);
        for v in &mut self.versions {
            v.is_active = v.id == id;
        }
        true
    }

    /// Deletes a version from the store and from local history.
    pub async fn delete_version(&mut self, id: Uuid) -> PersistenceResult<()> {
        self.gateway.delete_prompt_version(self.user_id, id).await?;
        self.versions.retain(|v| v.id != id);
        if self.active_version_id == Some(id) {
            self.active_version_id = None;
        }
        Ok(())
    }

    /// Preview of what the persona sees: base prompt, the profile placeholder
    /// and the formatted knowledge base. Not what is sent on a chat turn.
    pub fn full_prompt_with_context(&self, knowledge_base: &KnowledgeBase) -> String {
        format!(
            "{}\n\n{PROFILE_PLACEHOLDER}\n\n{KNOWLEDGE_BASE_SECTION}\n{}",
            self.final_prompt,
            format_knowledge_base(knowledge_base)
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::marketing::{MarketingPlan, MarketingPrompt, NewMarketingPrompt};
    use crate::models::profile::UserProfile;
    use crate::models::user::{NewUser, User};
    use crate::persistence::file::FileGateway;
    use crate::persistence::PersistenceError;

    fn file_gateway() -> (tempfile::TempDir, Arc<dyn PersistenceGateway>) {
        let dir = tempfile::tempdir().unwrap();
        let gw: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
        (dir, gw)
    }

    /// Gateway whose every call fails, for exercising error paths.
    pub(crate) struct BrokenGateway;

    fn broken() -> PersistenceError {
        PersistenceError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"))
    }

    #[async_trait]
    impl PersistenceGateway for BrokenGateway {
        async fn latest_profile(&self, _: Uuid) -> PersistenceResult<Option<UserProfile>> {
            Err(broken())
        }
        async fn upsert_profile(&self, _: Uuid, _: &UserProfile) -> PersistenceResult<()> {
            Err(broken())
        }
        async fn list_prompt_versions(&self, _: Uuid) -> PersistenceResult<Vec<PromptVersion>> {
            Err(broken())
        }
        async fn create_prompt_version(
            &self,
            _: Uuid,
            _: &str,
            _: bool,
        ) -> PersistenceResult<PromptVersion> {
            Err(broken())
        }
        async fn delete_prompt_version(&self, _: Uuid, _: Uuid) -> PersistenceResult<()> {
            Err(broken())
        }
        async fn list_marketing_prompts(&self, _: Uuid) -> PersistenceResult<Vec<MarketingPrompt>> {
            Err(broken())
        }
        async fn create_marketing_prompt(
            &self,
            _: Uuid,
            _: NewMarketingPrompt,
        ) -> PersistenceResult<MarketingPrompt> {
            Err(broken())
        }
        async fn delete_marketing_prompts(&self, _: Uuid) -> PersistenceResult<u64> {
            Err(broken())
        }
        async fn list_marketing_plans(&self, _: Uuid) -> PersistenceResult<Vec<MarketingPlan>> {
            Err(broken())
        }
        async fn add_marketing_plan(&self, _: Uuid, _: &MarketingPlan) -> PersistenceResult<()> {
            Err(broken())
        }
        async fn clear_marketing_plans(&self, _: Uuid) -> PersistenceResult<()> {
            Err(broken())
        }
        async fn create_user(&self, _: NewUser) -> PersistenceResult<User> {
            Err(broken())
        }
        async fn find_user_by_email(&self, _: &str) -> PersistenceResult<Option<User>> {
            Err(broken())
        }
        async fn delete_user(&self, _: Uuid) -> PersistenceResult<()> {
            Err(broken())
        }
    }

    #[tokio::test]
    async fn test_fresh_manager_uses_default_prompt() {
        let (_dir, gw) = file_gateway();
        let manager = FinalPromptManager::load(Uuid::new_v4(), gw).await.unwrap();
        assert_eq!(manager.final_prompt(), DEFAULT_FINAL_PROMPT);
        assert!(manager.versions().is_empty());
        assert!(manager.active_version_id().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_prompt() {
        let (_dir, gw) = file_gateway();
        let mut manager = FinalPromptManager::new(Uuid::new_v4(), gw);
        manager.set_final_prompt("Be concise.");
        let saved = manager.save_version().await.unwrap();

        assert!(manager.load_version(saved.id));
        assert_eq!(manager.final_prompt(), "Be concise.");
        assert_eq!(manager.active_version_id(), Some(saved.id));
    }

    #[tokio::test]
    async fn test_repeated_saves_leave_one_active_version() {
        let (_dir, gw) = file_gateway();
        let user = Uuid::new_v4();
        let mut manager = FinalPromptManager::new(user, gw.clone());
        for text in ["one", "two", "three"] {
            manager.set_final_prompt(text);
            manager.save_version().await.unwrap();
        }

        let local_active = manager.versions().iter().filter(|v| v.is_active).count();
        assert_eq!(local_active, 1);
        assert_eq!(manager.versions()[0].prompt, "three");

        let stored = gw.list_prompt_versions(user).await.unwrap();
        assert_eq!(stored.iter().filter(|v| v.is_active).count(), 1);
        assert_eq!(stored[0].prompt, "three");
    }

    #[tokio::test]
    async fn test_load_unknown_version_is_noop() {
        let (_dir, gw) = file_gateway();
        let mut manager = FinalPromptManager::new(Uuid::new_v4(), gw);
        manager.set_final_prompt("draft");
        assert!(!manager.load_version(Uuid::new_v4()));
        assert_eq!(manager.final_prompt(), "draft");
    }

    #[tokio::test]
    async fn test_startup_prefers_active_then_newest() {
        let (_dir, gw) = file_gateway();
        let user = Uuid::new_v4();
        let active = gw.create_prompt_version(user, "active one", true).await.unwrap();
        gw.create_prompt_version(user, "newer inactive", false).await.unwrap();

        let manager = FinalPromptManager::load(user, gw.clone()).await.unwrap();
        assert_eq!(manager.final_prompt(), "active one");
        assert_eq!(manager.active_version_id(), Some(active.id));

        let other = Uuid::new_v4();
        gw.create_prompt_version(other, "old", false).await.unwrap();
        gw.create_prompt_version(other, "new", false).await.unwrap();
        let manager = FinalPromptManager::load(other, gw).await.unwrap();
        assert_eq!(manager.final_prompt(), "new");
    }

    #[tokio::test]
    async fn test_failed_save_keeps_history() {
        let mut manager = FinalPromptManager::new(Uuid::new_v4(), Arc::new(BrokenGateway));
        manager.set_final_prompt("unsaved");
        assert!(manager.save_version().await.is_err());
        assert!(manager.versions().is_empty());
        assert!(manager.active_version_id().is_none());
        assert_eq!(manager.final_prompt(), "unsaved");
    }

    #[tokio::test]
    async fn test_deleting_active_version_clears_pointer() {
        let (_dir, gw) = file_gateway();
        let mut manager = FinalPromptManager::new(Uuid::new_v4(), gw);
        let saved = manager.save_version().await.unwrap();
        manager.delete_version(saved.id).await.unwrap();
        assert!(manager.versions().is_empty());
        assert!(manager.active_version_id().is_none());
    }

    #[test]
    fn test_full_prompt_has_placeholder_and_knowledge_base() {
        let manager = FinalPromptManager::new(Uuid::new_v4(), Arc::new(BrokenGateway));
        let full = manager.full_prompt_with_context(&KnowledgeBase::default());
        assert!(full.starts_with(DEFAULT_FINAL_PROMPT));
        assert!(full.contains("[User profile will be inserted here]"));
        assert!(full.contains("## Knowledge Base\n## DANA+"));
    }
}
