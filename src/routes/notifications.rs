//! Notification Endpoints
//!
//! Admin-triggered mail: per-participant payment reminders and an aggregate
//! monthly summary for the requesting administrator. The metrics engine
//! decides who is late; this layer only routes its output to the email
//! service. A participant whose reminder fails is logged and skipped; the
//! endpoint reports how many actually went out.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AdminUser,
    db::Payment,
    error::ApiError,
    services::{member_kpi, MonthlySummary},
    types::Month,
    AppState,
};

/// POST /api/notifications/reminders
pub async fn send_reminders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Value>, ApiError> {
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Email".to_string()))?;

    let current = Month::current();
    let monthly_due = state.db.monthly_due().await?;
    let currency = state.db.currency().await?;

    let participants = state.db.list_active_participants().await?;
    let mut by_participant: HashMap<Uuid, Vec<Payment>> = HashMap::new();
    for payment in state.db.payments_for_year(current.year()).await? {
        by_participant
            .entry(payment.participant_id)
            .or_default()
            .push(payment);
    }

    let empty = Vec::new();
    let mut sent = 0usize;
    for participant in &participants {
        let payments = by_participant.get(&participant.id).unwrap_or(&empty);
        let kpi = member_kpi(participant, payments, monthly_due, &current);
        if !kpi.is_late {
            continue;
        }

        match mailer
            .send_payment_reminder(
                &participant.name,
                &participant.email,
                current.as_str(),
                monthly_due,
                &currency,
            )
            .await
        {
            Ok(()) => sent += 1,
            Err(e) => {
                tracing::warn!("Reminder to {} failed: {e}", participant.email);
            }
        }
    }

    Ok(Json(json!({ "success": true, "sent": sent })))
}

/// POST /api/notifications/summary
///
/// Mails the aggregate state of the current year to the administrator who
/// asked for it.
pub async fn send_summary(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Value>, ApiError> {
    let mailer = state
        .mailer
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("Email".to_string()))?;

    let current = Month::current();
    let monthly_due = state.db.monthly_due().await?;
    let currency = state.db.currency().await?;

    let participants = state.db.list_active_participants().await?;
    let mut by_participant: HashMap<Uuid, Vec<Payment>> = HashMap::new();
    for payment in state.db.payments_for_year(current.year()).await? {
        by_participant
            .entry(payment.participant_id)
            .or_default()
            .push(payment);
    }

    let empty = Vec::new();
    let mut summary = MonthlySummary {
        total_confirmed: 0.0,
        total_pending: 0.0,
        late_count: 0,
        details: Vec::with_capacity(participants.len()),
        currency,
    };
    for participant in &participants {
        let payments = by_participant.get(&participant.id).unwrap_or(&empty);
        let kpi = member_kpi(participant, payments, monthly_due, &current);
        summary.total_confirmed += kpi.confirmed_year;
        summary.total_pending += kpi.pending_year;
        let status = if kpi.is_late {
            summary.late_count += 1;
            format!("{:.2} {} missing", kpi.missing, summary.currency)
        } else {
            "up to date".to_string()
        };
        summary.details.push((participant.name.clone(), status));
    }

    mailer
        .send_monthly_summary(&admin.email, &summary)
        .await
        .map_err(|e| {
            tracing::error!("Summary to {} failed: {e}", admin.email);
            ApiError::Internal
        })?;

    Ok(Json(json!({ "success": true, "recipients": 1 })))
}
