use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::knowledge::store::KnowledgeBaseStore;
use crate::llm_client::CompletionService;
use crate::persistence::PersistenceGateway;
use crate::session::{SessionHandle, SessionRegistry};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres or flat-file store, chosen by STORAGE_BACKEND.
    pub gateway: Arc<dyn PersistenceGateway>,
    pub llm: Arc<dyn CompletionService>,
    /// One catalogue for every operator.
    pub knowledge: Arc<RwLock<KnowledgeBaseStore>>,
    pub sessions: SessionRegistry,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        gateway: Arc<dyn PersistenceGateway>,
        llm: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            gateway,
            llm,
            knowledge: Arc::new(RwLock::new(KnowledgeBaseStore::default())),
            sessions: SessionRegistry::default(),
            config,
        }
    }

    pub async fn session(&self, user_id: Uuid) -> Result<SessionHandle, AppError> {
        Ok(self.sessions.get_or_load(user_id, &self.gateway).await?)
    }
}
