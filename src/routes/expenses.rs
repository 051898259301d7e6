//! Expense Split Endpoint
//!
//! An admin charges a shared expense to a set of participants. Shares come
//! from the pure split service; the resulting EXPENSE rows are confirmed
//! immediately and inserted as one transaction, so a failure mid-batch
//! leaves no partial charge behind.

use std::collections::HashMap;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    db::{Payment, PaymentMethod, PaymentStatus},
    error::ApiError,
    services::{compute_shares, SplitMode},
    types::Month,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub participants: Vec<Uuid>,
    pub total_amount: f64,
    pub reason: String,
    pub mode: SplitMode,
    /// Required for weighted mode; missing ids default to weight 1
    pub weights: Option<HashMap<Uuid, f64>>,
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<ExpenseRequest>,
) -> Result<Json<Value>, ApiError> {
    let shares = compute_shares(
        request.total_amount,
        &request.participants,
        request.mode,
        request.weights.as_ref(),
        &request.reason,
    )?;

    let month = Month::current();
    let now = Utc::now();
    let reason = request.reason.trim().to_string();

    let payments: Vec<Payment> = shares
        .into_iter()
        .map(|(participant_id, amount)| Payment {
            id: Uuid::new_v4(),
            participant_id,
            month: month.as_str().to_string(),
            amount,
            method: PaymentMethod::Expense,
            status: PaymentStatus::Confirmed,
            reason: Some(reason.clone()),
            recorded_at: now,
        })
        .collect();

    state.db.insert_payment_batch(&payments).await?;
    tracing::info!(
        "Expense '{}' split across {} participants",
        reason,
        payments.len()
    );

    Ok(Json(json!({ "success": true, "payments_created": payments.len() })))
}
