//! Per-operator session objects.
//!
//! Each authenticated user id gets one `AdvisorSession`, built from persisted
//! state on first use and kept for the life of the process. Requests lock the
//! session only around state changes; completion calls run with it unlocked.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::chat::orchestrator::ChatOrchestrator;
use crate::marketing::store::MarketingPlanStore;
use crate::persistence::{PersistenceGateway, PersistenceResult};
use crate::profile::store::ProfileStore;
use crate::prompting::final_prompt::FinalPromptManager;

pub struct AdvisorSession {
    pub profile: ProfileStore,
    pub prompts: FinalPromptManager,
    pub marketing: MarketingPlanStore,
    pub chat: ChatOrchestrator,
}

impl AdvisorSession {
    pub async fn load(
        user_id: Uuid,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> PersistenceResult<Self> {
        Ok(Self {
            profile: ProfileStore::load(user_id, gateway.clone()).await?,
            prompts: FinalPromptManager::load(user_id, gateway.clone()).await?,
            marketing: MarketingPlanStore::load(user_id, gateway).await?,
            chat: ChatOrchestrator::default(),
        })
    }
}

pub type SessionHandle = Arc<Mutex<AdvisorSession>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    /// Returns the user's session, loading it on first access. If two requests
    /// race on a cold session, the first one inserted is kept.
    pub async fn get_or_load(
        &self,
        user_id: Uuid,
        gateway: &Arc<dyn PersistenceGateway>,
    ) -> PersistenceResult<SessionHandle> {
        if let Some(existing) = self.sessions.get(&user_id).map(|entry| Arc::clone(entry.value())) {
            return Ok(existing);
        }

        let session = AdvisorSession::load(user_id, gateway.clone()).await?;
        let handle = self
            .sessions
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .value()
            .clone();
        info!("Opened advisor session for user {user_id}");
        Ok(handle)
    }

    /// Drops the cached session, e.g. after the account is deleted.
    pub fn evict(&self, user_id: Uuid) {
        self.sessions.remove(&user_id);
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::file::FileGateway;

    #[tokio::test]
    async fn test_same_user_shares_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let gw: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
        let registry = SessionRegistry::default();
        let user = Uuid::new_v4();

        let a = registry.get_or_load(user, &gw).await.unwrap();
        let b = registry.get_or_load(user, &gw).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        registry.get_or_load(Uuid::new_v4(), &gw).await.unwrap();
        assert_eq!(registry.active_sessions(), 2);

        registry.evict(user);
        assert_eq!(registry.active_sessions(), 1);
    }

    #[tokio::test]
    async fn test_session_loads_saved_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let gw: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
        let user = Uuid::new_v4();
        gw.create_prompt_version(user, "stored prompt", true)
            .await
            .unwrap();

        let registry = SessionRegistry::default();
        let handle = registry.get_or_load(user, &gw).await.unwrap();
        let session = handle.lock().await;
        assert_eq!(session.prompts.final_prompt(), "stored prompt");
        assert!(session.chat.messages().is_empty());
    }
}
