use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::marketing::{MarketingPlan, MarketingPrompt, NewMarketingPrompt};
use crate::models::profile::UserProfile;
use crate::models::prompt::PromptVersion;
use crate::models::user::{NewUser, User};
use crate::persistence::{
    MarketingPromptRecord, PersistenceError, PersistenceGateway, PersistenceResult,
};

/// PostgreSQL-backed gateway. Multi-step writes run in one transaction.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

const MAX_CONNECTIONS: u32 = 10;

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and brings the schema up to date.
    pub async fn connect(database_url: &str) -> PersistenceResult<Self> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!("PostgreSQL ready, migrations applied");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn latest_profile(&self, user_id: Uuid) -> PersistenceResult<Option<UserProfile>> {
        let row: Option<Json<UserProfile>> = sqlx::query_scalar(
            "SELECT data FROM user_profiles WHERE user_id = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|Json(profile)| profile))
    }

    async fn upsert_profile(&self, user_id: Uuid, profile: &UserProfile) -> PersistenceResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM user_profiles WHERE user_id = $1 ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some(id) => {
                sqlx::query("UPDATE user_profiles SET data = $1, updated_at = now() WHERE id = $2")
                    .bind(Json(profile))
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {
                sqlx::query("INSERT INTO user_profiles (id, user_id, data) VALUES ($1, $2, $3)")
                    .bind(Uuid::new_v4())
                    .bind(user_id)
                    .bind(Json(profile))
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_prompt_versions(&self, user_id: Uuid) -> PersistenceResult<Vec<PromptVersion>> {
        Ok(sqlx::query_as::<_, PromptVersion>(
            r#"
            SELECT id, prompt, created_at, is_active
            FROM prompt_versions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_prompt_version(
        &self,
        user_id: Uuid,
        prompt: &str,
        is_active: bool,
    ) -> PersistenceResult<PromptVersion> {
        let mut tx = self.pool.begin().await?;

        if is_active {
            sqlx::query(
                "UPDATE prompt_versions SET is_active = FALSE WHERE user_id = $1 AND is_active",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        let version = sqlx::query_as::<_, PromptVersion>(
            r#"
            INSERT INTO prompt_versions (id, user_id, prompt, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, prompt, created_at, is_active
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(prompt)
        .bind(is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Saved prompt version {} for user {user_id}", version.id);
        Ok(version)
    }

    async fn delete_prompt_version(&self, user_id: Uuid, id: Uuid) -> PersistenceResult<()> {
        let result = sqlx::query("DELETE FROM prompt_versions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound(format!("Prompt version {id}")));
        }
        Ok(())
    }

    async fn list_marketing_prompts(
        &self,
        user_id: Uuid,
    ) -> PersistenceResult<Vec<MarketingPrompt>> {
        let records = sqlx::query_as::<_, MarketingPromptRecord>(
            r#"
            SELECT id, prompt, best_products, marketing_technique, conversation_starter,
                   conversation_sequence, is_active, created_at, updated_at
            FROM marketing_prompts
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(MarketingPromptRecord::into_prompt).collect())
    }

    async fn create_marketing_prompt(
        &self,
        user_id: Uuid,
        new: NewMarketingPrompt,
    ) -> PersistenceResult<MarketingPrompt> {
        let record = MarketingPromptRecord::from_new(new)?;
        let mut tx = self.pool.begin().await?;

        // Any prior active prompt is retired, even when the new one is inactive.
        sqlx::query(
            r#"
            UPDATE marketing_prompts SET is_active = FALSE, updated_at = now()
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO marketing_prompts
                (id, user_id, prompt, best_products, marketing_technique, conversation_starter,
                 conversation_sequence, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(user_id)
        .bind(&record.prompt)
        .bind(&record.best_products)
        .bind(&record.marketing_technique)
        .bind(&record.conversation_starter)
        .bind(&record.conversation_sequence)
        .bind(record.is_active)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Created marketing prompt {} for user {user_id}", record.id);
        Ok(record.into_prompt())
    }

    async fn delete_marketing_prompts(&self, user_id: Uuid) -> PersistenceResult<u64> {
        let result = sqlx::query("DELETE FROM marketing_prompts WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_marketing_plans(&self, user_id: Uuid) -> PersistenceResult<Vec<MarketingPlan>> {
        let rows: Vec<Json<MarketingPlan>> = sqlx::query_scalar(
            "SELECT data FROM marketing_plans WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(plan)| plan).collect())
    }

    async fn add_marketing_plan(
        &self,
        user_id: Uuid,
        plan: &MarketingPlan,
    ) -> PersistenceResult<()> {
        sqlx::query(
            "INSERT INTO marketing_plans (id, user_id, data, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(plan.id)
        .bind(user_id)
        .bind(Json(plan))
        .bind(plan.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_marketing_plans(&self, user_id: Uuid) -> PersistenceResult<()> {
        sqlx::query("DELETE FROM marketing_plans WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_user(&self, new: NewUser) -> PersistenceResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                PersistenceError::Conflict(format!("User with email {} already exists", new.email)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> PersistenceResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> PersistenceResult<()> {
        let mut tx = self.pool.begin().await?;

        for table in [
            "user_profiles",
            "prompt_versions",
            "marketing_prompts",
            "marketing_plans",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound(format!("User {id}")));
        }

        tx.commit().await?;
        info!("Deleted user {id} and all stored data");
        Ok(())
    }
}
