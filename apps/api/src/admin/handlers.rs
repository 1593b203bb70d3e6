use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminKey;
use crate::errors::AppError;
use crate::models::user::{NewUser, User};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const BCRYPT_COST: u32 = 10;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("a valid email is required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// bcrypt runs on the blocking pool so a slow hash never stalls the runtime.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// POST /api/admin/users
pub async fn handle_create_user(
    _admin: AdminKey,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    req.validate()?;
    let email = req.email.trim().to_string();

    if state.gateway.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "User with email {email} already exists"
        )));
    }

    let password_hash = hash_password(req.password).await?;
    let user = state
        .gateway
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email,
            password_hash,
        })
        .await?;
    info!("Admin created user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /api/admin/users/:id
pub async fn handle_delete_user(
    _admin: AdminKey,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.gateway.delete_user(id).await?;
    state.sessions.evict(id);
    info!("Admin deleted user {id}");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_is_salted_bcrypt() {
        let a = hash_password("correct horse".to_string()).await.unwrap();
        let b = hash_password("correct horse".to_string()).await.unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$2b$10$"));
        assert!(bcrypt::verify("correct horse", &a).unwrap());
        assert!(!bcrypt::verify("wrong horse", &a).unwrap());
    }

    #[test]
    fn test_request_validation() {
        let req = |name: &str, email: &str, password: &str| CreateUserRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        };
        assert!(req("Ana", "ana@example.com", "longenough").validate().is_ok());
        assert!(req(" ", "ana@example.com", "longenough").validate().is_err());
        assert!(req("Ana", "not-an-email", "longenough").validate().is_err());
        assert!(req("Ana", "ana@example.com", "short").validate().is_err());
    }
}
