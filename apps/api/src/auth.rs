//! Request authentication.
//!
//! Operator sessions are established upstream; the proxy forwards the
//! authenticated user id in `x-user-id`. Admin endpoints instead carry a
//! shared secret in `x-api-key`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const API_KEY_HEADER: &str = "x-api-key";

/// The authenticated operator of a request.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                warn!("Request without {USER_ID_HEADER} header");
                AppError::Unauthorized
            })?;

        Uuid::parse_str(raw.trim()).map(SessionUser).map_err(|_| {
            warn!("Malformed {USER_ID_HEADER} header");
            AppError::Unauthorized
        })
    }
}

/// Proof that the request carried the configured admin key.
#[derive(Debug, Clone, Copy)]
pub struct AdminKey;

#[async_trait]
impl FromRequestParts<AppState> for AdminKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_api_key.as_deref() else {
            warn!("Admin request rejected: ADMIN_API_KEY is not configured");
            return Err(AppError::Unauthorized);
        };

        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            Some(key) if keys_match(key, expected) => Ok(AdminKey),
            _ => {
                warn!("Admin request rejected: bad or missing {API_KEY_HEADER}");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Compares SHA-256 digests so timing reveals neither content nor key length.
fn keys_match(provided: &str, expected: &str) -> bool {
    constant_time_eq(&Sha256::digest(provided), &Sha256::digest(expected))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }

    #[test]
    fn test_keys_match_any_length() {
        assert!(keys_match("admin-key", "admin-key"));
        assert!(!keys_match("admin", "admin-key"));
        assert!(!keys_match("", "admin-key"));
    }
}
