//! Authentication Module
//!
//! Bearer-token auth: HS256 JWTs carrying the participant id and email,
//! argon2 password hashing, and two request extractors:
//!
//! - [`CurrentUser`]: any active participant with a valid token;
//! - [`AdminUser`]: additionally requires the token email to be on the
//!   configured admin allow-list.
//!
//! Admin status is derived from configuration, not stored on the row, so
//! promoting someone is a config change rather than a migration.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::{Alphanumeric, DistString};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{db::Participant, error::ApiError, AppState};

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Participant id
    pub sub: Uuid,
    /// Participant email at issue time; the admin check runs against this
    pub email: String,
    /// Issued-at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Password hashing failed: {e}");
            ApiError::Internal
        })?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Random initial password for admin-created accounts.
pub fn generate_password() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), 12)
}

pub fn encode_token(
    participant: &Participant,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, ApiError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: participant.id,
        email: participant.email.clone(),
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("Token encoding failed: {e}");
        ApiError::Internal
    })
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)
}

/// Authenticated participant, loaded fresh from the database so revoked or
/// deactivated accounts are rejected even with a still-valid token.
pub struct CurrentUser(pub Participant);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = decode_token(token, &state.config.jwt_secret)?;

        let participant = state
            .db
            .find_participant(claims.sub)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        if !participant.active {
            return Err(ApiError::Unauthorized);
        }

        Ok(CurrentUser(participant))
    }
}

/// Authenticated participant on the admin allow-list.
pub struct AdminUser(pub Participant);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(participant) = CurrentUser::from_request_parts(parts, state).await?;

        if !state.config.is_admin_email(&participant.email) {
            return Err(ApiError::Forbidden);
        }

        Ok(AdminUser(participant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn participant() -> Participant {
        Participant {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            password_hash: String::new(),
            active: true,
            start_month: "2026-01".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_roundtrip() {
        let p = participant();
        let token = encode_token(&p, "secret", 3600).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, p.id);
        assert_eq!(claims.email, p.email);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let p = participant();
        let token = encode_token(&p, "secret", 3600).unwrap();
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let p = participant();
        // Expired an hour ago; the 60s default leeway does not save it.
        let token = encode_token(&p, "secret", -3600).unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }

    #[test]
    fn test_generated_password_length() {
        assert_eq!(generate_password().len(), 12);
    }
}
