//! Payment Endpoints
//!
//! Participants declare their own contributions (pending); admins correct,
//! delete or confirm them. The one-regular-payment-per-month rule is carried
//! by a partial unique index, so a concurrent double declaration fails in
//! the database and surfaces as a 409 here.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::{AdminUser, CurrentUser},
    db::{Payment, PaymentMethod, PaymentStatus, PaymentUpdate},
    error::ApiError,
    types::Month,
    AppState,
};

// ============ Request Types ============

#[derive(Debug, Deserialize)]
pub struct PaymentCreate {
    pub month: Month,
    pub amount: f64,
    pub method: PaymentMethod,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentPatch {
    pub amount: Option<f64>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmMonthRequest {
    pub month: Month,
}

// ============ Handlers ============

/// GET /api/payments, the caller's own rows.
pub async fn list_own_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.db.payments_for_participant(user.id).await?))
}

/// GET /api/payments/all
pub async fn list_all_payments(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.db.list_payments().await?))
}

/// POST /api/payments, self-declaration, always pending.
pub async fn create_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<PaymentCreate>,
) -> Result<Json<Payment>, ApiError> {
    if request.amount < 0.0 {
        return Err(ApiError::Validation("Amount cannot be negative".to_string()));
    }

    let payment = Payment {
        id: Uuid::new_v4(),
        participant_id: user.id,
        month: request.month.as_str().to_string(),
        amount: request.amount,
        method: request.method,
        status: PaymentStatus::Pending,
        reason: request.reason,
        recorded_at: Utc::now(),
    };

    state.db.insert_payment(&payment).await.map_err(|e| match e {
        ApiError::Conflict(_) => {
            ApiError::Conflict("A payment already exists for this month".to_string())
        }
        other => other,
    })?;

    Ok(Json(payment))
}

/// PUT /api/payments/:id, admin partial update.
pub async fn update_payment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(request): Json<PaymentPatch>,
) -> Result<Json<Payment>, ApiError> {
    if let Some(amount) = request.amount {
        if amount < 0.0 {
            return Err(ApiError::Validation("Amount cannot be negative".to_string()));
        }
    }

    let update = PaymentUpdate {
        amount: request.amount,
        method: request.method,
        status: request.status,
        reason: request.reason,
    };

    let updated = state
        .db
        .update_payment(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment".to_string()))?;

    Ok(Json(updated))
}

/// DELETE /api/payments/:id
pub async fn delete_payment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_payment(id).await? {
        return Err(ApiError::NotFound("Payment".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// POST /api/payments/confirm-month, bulk-confirm a month's pending rows.
pub async fn confirm_month(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ConfirmMonthRequest>,
) -> Result<Json<Value>, ApiError> {
    let modified = state.db.confirm_month(request.month.as_str()).await?;
    tracing::info!("Confirmed {modified} payments for {}", request.month);
    Ok(Json(json!({ "success": true, "modified": modified })))
}
