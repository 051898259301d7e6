//! KPI Endpoints
//!
//! Handlers fetch the ledger rows and the configured due amount, then defer
//! to the pure metrics engine. The admin aggregation loads the whole year
//! once and groups in memory instead of querying per participant.

use std::collections::HashMap;

use axum::{extract::State, Json};
use uuid::Uuid;

use crate::{
    auth::{AdminUser, CurrentUser},
    db::Payment,
    error::ApiError,
    services::{member_kpi, participant_kpi, MemberKpi, ParticipantKpi},
    types::Month,
    AppState,
};

/// GET /api/kpi/participant
pub async fn participant_kpis(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ParticipantKpi>, ApiError> {
    let current = Month::current();
    let monthly_due = state.db.monthly_due().await?;
    let payments = state
        .db
        .payments_for_participant_year(user.id, current.year())
        .await?;

    Ok(Json(participant_kpi(&payments, monthly_due, &current)))
}

/// GET /api/kpi/admin
///
/// One record per active participant; order is unspecified.
pub async fn admin_kpis(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<MemberKpi>>, ApiError> {
    let current = Month::current();
    let monthly_due = state.db.monthly_due().await?;

    let participants = state.db.list_active_participants().await?;
    let mut by_participant: HashMap<Uuid, Vec<Payment>> = HashMap::new();
    for payment in state.db.payments_for_year(current.year()).await? {
        by_participant
            .entry(payment.participant_id)
            .or_default()
            .push(payment);
    }

    let empty = Vec::new();
    let kpis = participants
        .iter()
        .map(|p| {
            let payments = by_participant.get(&p.id).unwrap_or(&empty);
            member_kpi(p, payments, monthly_due, &current)
        })
        .collect();

    Ok(Json(kpis))
}
