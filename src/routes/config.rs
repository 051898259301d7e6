//! Config Endpoints
//!
//! The flat key/value mapping (monthly due, currency, title). Reading is
//! open so the login screen can show the title; writing is admin-only.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{auth::AdminUser, db::ConfigEntry, error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    pub value: String,
}

/// GET /api/config
pub async fn list_config(State(state): State<AppState>) -> Result<Json<Vec<ConfigEntry>>, ApiError> {
    Ok(Json(state.db.list_config().await?))
}

/// PUT /api/config/:key
pub async fn update_config(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(key): Path<String>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<Value>, ApiError> {
    state.db.upsert_config(&key, &update.value).await?;
    Ok(Json(json!({ "success": true })))
}
