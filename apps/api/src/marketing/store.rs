use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::marketing::prompts::DEFAULT_MARKETING_PROMPT;
use crate::models::marketing::{MarketingPlan, MarketingPrompt, NewMarketingPrompt};
use crate::persistence::{PersistenceGateway, PersistenceResult};

/// Per-user marketing state: the prompt being edited and the generated plans,
/// newest first. Saved marketing prompts live only in the store behind the
/// gateway and are read through on demand.
pub struct MarketingPlanStore {
    user_id: Uuid,
    gateway: Arc<dyn PersistenceGateway>,
    current_prompt: String,
    plans: Vec<MarketingPlan>,
}

impl MarketingPlanStore {
    pub async fn load(
        user_id: Uuid,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> PersistenceResult<Self> {
        let plans = gateway.list_marketing_plans(user_id).await?;
        Ok(Self {
            user_id,
            gateway,
            current_prompt: DEFAULT_MARKETING_PROMPT.to_string(),
            plans,
        })
    }

    pub fn current_prompt(&self) -> &str {
        &self.current_prompt
    }

    pub fn set_current_prompt(&mut self, text: impl Into<String>) {
        self.current_prompt = text.into();
    }

    pub fn plans(&self) -> &[MarketingPlan] {
        &self.plans
    }

    /// Persists the plan, then puts it at the front of the local list.
    pub async fn add_plan(&mut self, plan: MarketingPlan) -> PersistenceResult<&MarketingPlan> {
        if let Err(e) = self.gateway.add_marketing_plan(self.user_id, &plan).await {
            error!("Failed to store marketing plan for user {}: {e}", self.user_id);
            return Err(e);
        }
        self.plans.insert(0, plan);
        Ok(&self.plans[0])
    }

    pub async fn clear_plans(&mut self) -> PersistenceResult<()> {
        self.gateway.clear_marketing_plans(self.user_id).await?;
        info!("Cleared {} marketing plans for user {}", self.plans.len(), self.user_id);
        self.plans.clear();
        Ok(())
    }

    pub async fn saved_prompts(&self) -> PersistenceResult<Vec<MarketingPrompt>> {
        self.gateway.list_marketing_prompts(self.user_id).await
    }

    pub async fn save_prompt(&self, new: NewMarketingPrompt) -> PersistenceResult<MarketingPrompt> {
        self.gateway.create_marketing_prompt(self.user_id, new).await
    }

    pub async fn delete_saved_prompts(&self) -> PersistenceResult<u64> {
        self.gateway.delete_marketing_prompts(self.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketing::baseline::baseline_plan;
    use crate::models::profile::UserProfile;
    use crate::persistence::file::FileGateway;
    use crate::prompting::final_prompt::tests::BrokenGateway;

    #[tokio::test]
    async fn test_plans_are_newest_first_and_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let gw: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
        let user = Uuid::new_v4();

        let mut store = MarketingPlanStore::load(user, gw.clone()).await.unwrap();
        assert_eq!(store.current_prompt(), DEFAULT_MARKETING_PROMPT);
        let first = baseline_plan(&UserProfile::default());
        let second = baseline_plan(&UserProfile::default());
        store.add_plan(first.clone()).await.unwrap();
        store.add_plan(second.clone()).await.unwrap();
        assert_eq!(store.plans()[0].id, second.id);

        let reloaded = MarketingPlanStore::load(user, gw).await.unwrap();
        let ids: Vec<_> = reloaded.plans().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_clear_empties_store_and_disk() {
        let dir = tempfile::tempdir().unwrap();
        let gw: Arc<dyn PersistenceGateway> = Arc::new(FileGateway::new(dir.path()));
        let user = Uuid::new_v4();
        let mut store = MarketingPlanStore::load(user, gw.clone()).await.unwrap();
        store
            .add_plan(baseline_plan(&UserProfile::default()))
            .await
            .unwrap();

        store.clear_plans().await.unwrap();
        assert!(store.plans().is_empty());
        assert!(gw.list_marketing_plans(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_add_leaves_list_alone() {
        let mut store = MarketingPlanStore {
            user_id: Uuid::new_v4(),
            gateway: Arc::new(BrokenGateway),
            current_prompt: String::new(),
            plans: Vec::new(),
        };
        assert!(store
            .add_plan(baseline_plan(&UserProfile::default()))
            .await
            .is_err());
        assert!(store.plans().is_empty());
    }
}
