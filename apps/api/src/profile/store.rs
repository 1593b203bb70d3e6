use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{ProfilePatch, UserProfile};
use crate::persistence::{PersistenceGateway, PersistenceResult};

/// The synthetic end-user profile of one operator.
///
/// Writes apply in memory first and are then persisted. A failed write is
/// logged and reported, but the in-memory change stays.
pub struct ProfileStore {
    user_id: Uuid,
    gateway: Arc<dyn PersistenceGateway>,
    profile: UserProfile,
}

impl ProfileStore {
    /// Latest persisted profile, or the default one for a new user.
    pub async fn load(
        user_id: Uuid,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> PersistenceResult<Self> {
        let profile = match gateway.latest_profile(user_id).await? {
            Some(profile) => profile,
            None => {
                info!("No stored profile for user {user_id}; using defaults");
                UserProfile::default()
            }
        };
        Ok(Self {
            user_id,
            gateway,
            profile,
        })
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Field-by-field update. Rejected as a whole when the result is out of range.
    pub async fn update(&mut self, patch: ProfilePatch) -> Result<&UserProfile, AppError> {
        let updated = self.profile.merged(patch);
        self.replace(updated).await
    }

    /// Wholesale replacement.
    pub async fn replace(&mut self, profile: UserProfile) -> Result<&UserProfile, AppError> {
        profile.validate().map_err(AppError::Validation)?;
        self.profile = profile;
        self.persist().await?;
        Ok(&self.profile)
    }

    pub async fn reset(&mut self) -> Result<&UserProfile, AppError> {
        self.profile = UserProfile::default();
        self.persist().await?;
        Ok(&self.profile)
    }

    async fn persist(&self) -> Result<(), AppError> {
        if let Err(e) = self.gateway.upsert_profile(self.user_id, &self.profile).await {
            error!("Failed to persist profile for user {}: {e}", self.user_id);
            return Err(e.into());
        }
        Ok(())
    }
}
