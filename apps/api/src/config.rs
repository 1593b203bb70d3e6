use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Which persistence backend the gateway is built on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    File { data_dir: PathBuf },
}

/// How the completion API key is presented to the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAuth {
    /// `Authorization: Bearer <key>` (OpenAI style)
    Bearer,
    /// `api-key: <key>` (Azure OpenAI style)
    ApiKeyHeader,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub completion_api_url: String,
    pub completion_api_key: String,
    pub completion_auth: CompletionAuth,
    pub completion_model: Option<String>,
    /// Shared secret for the admin endpoints. `None` disables them.
    pub admin_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match optional_env("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .as_str()
        {
            "postgres" => StorageBackend::Postgres {
                database_url: require_env("DATABASE_URL")?,
            },
            "file" => StorageBackend::File {
                data_dir: PathBuf::from(
                    optional_env("DATA_DIR").unwrap_or_else(|| "./data".to_string()),
                ),
            },
            other => bail!("STORAGE_BACKEND must be 'postgres' or 'file', got '{other}'"),
        };

        let completion_auth = match optional_env("COMPLETION_AUTH_HEADER")
            .unwrap_or_else(|| "authorization".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "authorization" => CompletionAuth::Bearer,
            "api-key" => CompletionAuth::ApiKeyHeader,
            other => bail!("COMPLETION_AUTH_HEADER must be 'authorization' or 'api-key', got '{other}'"),
        };

        Ok(Config {
            storage,
            completion_api_url: require_env("COMPLETION_API_URL")?,
            completion_api_key: require_env("COMPLETION_API_KEY")?,
            completion_auth,
            completion_model: optional_env("COMPLETION_MODEL"),
            admin_api_key: optional_env("ADMIN_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Reads an env var, treating an empty value as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
