//! CSV Export Endpoints
//!
//! Returns the rendered CSV as a JSON field rather than an attachment; the
//! frontend handles the file download.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::{AdminUser, CurrentUser},
    error::ApiError,
    services::export,
    AppState,
};

/// GET /api/export/csv/:participant_id (self or admin).
pub async fn export_participant_csv(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let is_admin = state.config.is_admin_email(&user.email);
    if !is_admin && user.id != participant_id {
        return Err(ApiError::Forbidden);
    }

    let payments = state.db.payments_for_participant(participant_id).await?;
    Ok(Json(json!({ "csv": export::participant_csv(&payments) })))
}

/// GET /api/export/csv-all
pub async fn export_full_csv(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let names: HashMap<Uuid, String> = state
        .db
        .list_participants()
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let payments = state.db.list_payments().await?;
    Ok(Json(json!({ "csv": export::full_csv(&payments, &names) })))
}
