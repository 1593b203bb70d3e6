//! Flat-file gateway: one JSON document per resource type, per user.
//!
//! Layout under the data directory:
//!
//! ```text
//! accounts.json
//! users/<user_id>/profile.json
//! users/<user_id>/prompt-versions.json
//! users/<user_id>/marketing-prompts.json
//! users/<user_id>/marketing-plans.json
//! ```
//!
//! Every write is a read-modify-write of the whole document, serialized by one
//! in-process lock. Across processes the last writer wins.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::marketing::{MarketingPlan, MarketingPrompt, NewMarketingPrompt};
use crate::models::profile::UserProfile;
use crate::models::prompt::PromptVersion;
use crate::models::user::{NewUser, User};
use crate::persistence::{
    MarketingPromptRecord, PersistenceError, PersistenceGateway, PersistenceResult,
};

const ACCOUNTS_FILE: &str = "accounts.json";
const PROFILE_FILE: &str = "profile.json";
const PROMPT_VERSIONS_FILE: &str = "prompt-versions.json";
const MARKETING_PROMPTS_FILE: &str = "marketing-prompts.json";
const MARKETING_PLANS_FILE: &str = "marketing-plans.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    profile: UserProfile,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionsDoc {
    versions: Vec<PromptVersion>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct MarketingPromptsDoc {
    prompts: Vec<MarketingPromptRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlansDoc {
    plans: Vec<MarketingPlan>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    #[serde(flatten)]
    user: User,
    password_hash: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsDoc {
    users: Vec<StoredUser>,
}

pub struct FileGateway {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn user_file(&self, user_id: Uuid, name: &str) -> PathBuf {
        self.root.join("users").join(user_id.to_string()).join(name)
    }
}

/// Reads a JSON document, returning the default value when the file is absent.
async fn read_doc<T: DeserializeOwned + Default>(path: &Path) -> PersistenceResult<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Writes via a temp file + rename so readers never see a half-written document.
async fn write_doc<T: Serialize>(path: &Path, doc: &T) -> PersistenceResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[async_trait]
impl PersistenceGateway for FileGateway {
    async fn latest_profile(&self, user_id: Uuid) -> PersistenceResult<Option<UserProfile>> {
        let stored: Option<StoredProfile> =
            read_doc(&self.user_file(user_id, PROFILE_FILE)).await?;
        Ok(stored.map(|s| s.profile))
    }

    async fn upsert_profile(&self, user_id: Uuid, profile: &UserProfile) -> PersistenceResult<()> {
        let _guard = self.write_lock.lock().await;
        let stored = StoredProfile {
            profile: profile.clone(),
            updated_at: Utc::now(),
        };
        write_doc(&self.user_file(user_id, PROFILE_FILE), &Some(stored)).await
    }

    async fn list_prompt_versions(&self, user_id: Uuid) -> PersistenceResult<Vec<PromptVersion>> {
        let doc: VersionsDoc = read_doc(&self.user_file(user_id, PROMPT_VERSIONS_FILE)).await?;
        Ok(doc.versions)
    }

    async fn create_prompt_version(
        &self,
        user_id: Uuid,
        prompt: &str,
        is_active: bool,
    ) -> PersistenceResult<PromptVersion> {
        let _guard = self.write_lock.lock().await;
        let path = self.user_file(user_id, PROMPT_VERSIONS_FILE);
        let mut doc: VersionsDoc = read_doc(&path).await?;

        if is_active {
            for v in &mut doc.versions {
                v.is_active = false;
            }
        }

        let version = PromptVersion {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            created_at: Utc::now(),
            is_active,
        };
        doc.versions.insert(0, version.clone());
        write_doc(&path, &doc).await?;

        info!("Saved prompt version {} for user {user_id}", version.id);
        Ok(version)
    }

    async fn delete_prompt_version(&self, user_id: Uuid, id: Uuid) -> PersistenceResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.user_file(user_id, PROMPT_VERSIONS_FILE);
        let mut doc: VersionsDoc = read_doc(&path).await?;

        let before = doc.versions.len();
        doc.versions.retain(|v| v.id != id);
        if doc.versions.len() == before {
            return Err(PersistenceError::NotFound(format!("Prompt version {id}")));
        }
        write_doc(&path, &doc).await
    }

    async fn list_marketing_prompts(
        &self,
        user_id: Uuid,
    ) -> PersistenceResult<Vec<MarketingPrompt>> {
        let doc: MarketingPromptsDoc =
            read_doc(&self.user_file(user_id, MARKETING_PROMPTS_FILE)).await?;
        Ok(doc
            .prompts
            .into_iter()
            .map(MarketingPromptRecord::into_prompt)
            .collect())
    }

    async fn create_marketing_prompt(
        &self,
        user_id: Uuid,
        new: NewMarketingPrompt,
    ) -> PersistenceResult<MarketingPrompt> {
        let _guard = self.write_lock.lock().await;
        let path = self.user_file(user_id, MARKETING_PROMPTS_FILE);
        let mut doc: MarketingPromptsDoc = read_doc(&path).await?;

        let record = MarketingPromptRecord::from_new(new)?;
        let now = Utc::now();
        for existing in doc.prompts.iter_mut().filter(|p| p.is_active) {
            existing.is_active = false;
            existing.updated_at = now;
        }
        doc.prompts.insert(0, record.clone());
        write_doc(&path, &doc).await?;

        info!("Created marketing prompt {} for user {user_id}", record.id);
        Ok(record.into_prompt())
    }

    async fn delete_marketing_prompts(&self, user_id: Uuid) -> PersistenceResult<u64> {
        let _guard = self.write_lock.lock().await;
        let path = self.user_file(user_id, MARKETING_PROMPTS_FILE);
        let doc: MarketingPromptsDoc = read_doc(&path).await?;
        write_doc(&path, &MarketingPromptsDoc::default()).await?;
        Ok(doc.prompts.len() as u64)
    }

    async fn list_marketing_plans(&self, user_id: Uuid) -> PersistenceResult<Vec<MarketingPlan>> {
        let doc: PlansDoc = read_doc(&self.user_file(user_id, MARKETING_PLANS_FILE)).await?;
        Ok(doc.plans)
    }

    async fn add_marketing_plan(
        &self,
        user_id: Uuid,
        plan: &MarketingPlan,
    ) -> PersistenceResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.user_file(user_id, MARKETING_PLANS_FILE);
        let mut doc: PlansDoc = read_doc(&path).await?;
        doc.plans.insert(0, plan.clone());
        write_doc(&path, &doc).await
    }

    async fn clear_marketing_plans(&self, user_id: Uuid) -> PersistenceResult<()> {
        let _guard = self.write_lock.lock().await;
        write_doc(
            &self.user_file(user_id, MARKETING_PLANS_FILE),
            &PlansDoc::default(),
        )
        .await
    }

    async fn create_user(&self, new: NewUser) -> PersistenceResult<User> {
        let _guard = self.write_lock.lock().await;
        let path = self.root.join(ACCOUNTS_FILE);
        let mut doc: AccountsDoc = read_doc(&path).await?;

        if doc
            .users
            .iter()
            .any(|u| u.user.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(PersistenceError::Conflict(format!(
                "User with email {} already exists",
                new.email
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            created_at: Utc::now(),
        };
        doc.users.push(StoredUser {
            user: user.clone(),
            password_hash: new.password_hash,
        });
        write_doc(&path, &doc).await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> PersistenceResult<Option<User>> {
        let doc: AccountsDoc = read_doc(&self.root.join(ACCOUNTS_FILE)).await?;
        Ok(doc
            .users
            .into_iter()
            .find(|u| u.user.email.eq_ignore_ascii_case(email))
            .map(|u| u.user))
    }

    async fn delete_user(&self, id: Uuid) -> PersistenceResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.root.join(ACCOUNTS_FILE);
        let mut doc: AccountsDoc = read_doc(&path).await?;

        let before = doc.users.len();
        doc.users.retain(|u| u.user.id != id);
        if doc.users.len() == before {
            return Err(PersistenceError::NotFound(format!("User {id}")));
        }
        write_doc(&path, &doc).await?;

        let user_dir = self.root.join("users").join(id.to_string());
        match tokio::fs::remove_dir_all(&user_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!("Deleted user {id} and all stored data");
        Ok(())
    }
}
