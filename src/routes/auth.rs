//! Auth Endpoints
//!
//! Login issues a bearer token; `/auth/me` echoes the authenticated
//! participant. Failed logins never say which of email/password was wrong.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{self, CurrentUser},
    db::Participant,
    error::ApiError,
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Participant,
    pub is_admin: bool,
}

// ============ Handlers ============

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let participant = state
        .db
        .find_participant_by_email(&request.email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !participant.active {
        return Err(ApiError::Unauthorized);
    }

    if !auth::verify_password(&request.password, &participant.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = auth::encode_token(
        &participant,
        &state.config.jwt_secret,
        state.config.token_ttl_secs,
    )?;
    let is_admin = state.config.is_admin_email(&participant.email);

    Ok(Json(LoginResponse {
        token,
        user: participant,
        is_admin,
    }))
}

/// GET /api/auth/me
pub async fn me(CurrentUser(participant): CurrentUser) -> Json<Participant> {
    Json(participant)
}
