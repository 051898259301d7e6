//! Participant Endpoints
//!
//! Admin-managed membership. Accounts are never physically removed: deletion
//! deactivates, keeping the ledger attached. The guard rails live here:
//! no self-deletion, and the last active admin cannot be removed.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::{self, AdminUser, CurrentUser},
    db::Participant,
    error::ApiError,
    types::Month,
    AppState,
};

// ============ Request/Response Types ============

#[derive(Debug, Deserialize)]
pub struct ParticipantUpsert {
    pub name: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Defaults to the current month on creation
    pub start_month: Option<Month>,
    /// Generated when absent on creation
    pub password: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CreatedParticipant {
    #[serde(flatten)]
    pub participant: Participant,
    /// Returned once so the admin can hand it over; never retrievable again
    pub initial_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: String,
}

// ============ Handlers ============

/// GET /api/participants
pub async fn list_participants(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Participant>>, ApiError> {
    Ok(Json(state.db.list_participants().await?))
}

/// POST /api/participants
pub async fn create_participant(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ParticipantUpsert>,
) -> Result<Json<CreatedParticipant>, ApiError> {
    if request.name.trim().is_empty() || request.email.trim().is_empty() {
        return Err(ApiError::Validation("Name and email are required".to_string()));
    }

    let generated = request.password.is_none();
    let password = request.password.unwrap_or_else(auth::generate_password);

    let participant = Participant {
        id: Uuid::new_v4(),
        name: request.name,
        email: request.email.to_lowercase(),
        password_hash: auth::hash_password(&password)?,
        active: request.active,
        start_month: request
            .start_month
            .unwrap_or_else(Month::current)
            .as_str()
            .to_string(),
        created_at: Utc::now(),
    };

    // Duplicate email hits the unique constraint and comes back as 409.
    state.db.insert_participant(&participant).await?;

    tracing::info!("Participant created: {}", participant.email);
    Ok(Json(CreatedParticipant {
        participant,
        initial_password: generated.then_some(password),
    }))
}

/// PUT /api/participants/:id
pub async fn update_participant(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ParticipantUpsert>,
) -> Result<Json<Participant>, ApiError> {
    let current = state
        .db
        .find_participant(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Participant".to_string()))?;

    // Deactivating through an update obeys the same last-admin guard as a
    // delete.
    if current.active && !request.active && state.config.is_admin_email(&current.email) {
        let active_admins = state
            .db
            .count_active_admins(&state.config.admin_emails)
            .await?;
        if active_admins <= 1 {
            return Err(ApiError::Conflict(
                "Cannot deactivate the last administrator".to_string(),
            ));
        }
    }

    let start_month = match request.start_month {
        Some(month) => month,
        None => Month::parse(&current.start_month).unwrap_or_else(|_| Month::current()),
    };

    let updated = state
        .db
        .update_participant(
            id,
            &request.name,
            &request.email.to_lowercase(),
            request.active,
            start_month.as_str(),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("Participant".to_string()))?;

    if let Some(password) = request.password {
        state
            .db
            .update_password(id, &auth::hash_password(&password)?)
            .await?;
    }

    Ok(Json(updated))
}

/// PUT /api/participants/:id/password
///
/// Participants change their own password (with the current one as proof);
/// admins may reset anyone's without it.
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<PasswordChange>,
) -> Result<Json<Value>, ApiError> {
    let is_admin = state.config.is_admin_email(&user.email);

    if id != user.id && !is_admin {
        return Err(ApiError::Forbidden);
    }

    if request.new_password.trim().is_empty() {
        return Err(ApiError::Validation("New password is required".to_string()));
    }

    if id == user.id && !is_admin {
        let current = request.current_password.as_deref().ok_or_else(|| {
            ApiError::Validation("Current password is required".to_string())
        })?;
        if !auth::verify_password(current, &user.password_hash) {
            return Err(ApiError::Validation("Current password is incorrect".to_string()));
        }
    }

    let updated = state
        .db
        .update_password(id, &auth::hash_password(&request.new_password)?)
        .await?;
    if !updated {
        return Err(ApiError::NotFound("Participant".to_string()));
    }

    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/participants/:id
pub async fn delete_participant(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if id == admin.id {
        return Err(ApiError::Conflict("You cannot delete yourself".to_string()));
    }

    let participant = state
        .db
        .find_participant(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Participant".to_string()))?;

    // Read-then-write guard; may race under concurrent admin deletions,
    // which is an accepted limitation.
    if state.config.is_admin_email(&participant.email) {
        let active_admins = state
            .db
            .count_active_admins(&state.config.admin_emails)
            .await?;
        if active_admins <= 1 {
            return Err(ApiError::Conflict(
                "Cannot delete the last administrator".to_string(),
            ));
        }
    }

    state.db.deactivate_participant(id).await?;
    tracing::info!("Participant deactivated: {}", participant.email);

    Ok(Json(json!({ "success": true })))
}
