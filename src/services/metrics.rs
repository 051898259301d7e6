//! KPI Metrics Engine
//!
//! Pure, deterministic aggregation over ledger rows. Handlers fetch the
//! relevant payments and hand them to these functions together with the
//! monthly due amount and the current month; nothing here touches the
//! database or the clock.

use serde::Serialize;
use uuid::Uuid;

use crate::db::{Participant, Payment, PaymentStatus};
use crate::types::Month;

/// Self-service KPI: one participant's view of the current year.
#[derive(Debug, Serialize)]
pub struct ParticipantKpi {
    /// Confirmed amounts for the current year
    pub confirmed_year: f64,
    /// Self-declared but not yet confirmed
    pub pending_year: f64,
    /// What is still owed for the current month (never negative)
    pub remaining_this_month: f64,
}

/// Admin view of one member's compliance.
#[derive(Debug, Serialize)]
pub struct MemberKpi {
    pub participant_id: Uuid,
    pub name: String,
    pub confirmed_year: f64,
    pub pending_year: f64,
    /// due * expected_months - confirmed, floored at zero
    pub missing: f64,
    /// confirmed / expected * 100; zero when nothing is expected yet
    pub progress_percent: f64,
    /// A month before the current one lacks a confirmed payment
    pub is_late: bool,
}

fn sum_with_status(payments: &[Payment], status: PaymentStatus) -> f64 {
    payments
        .iter()
        .filter(|p| p.status == status)
        .map(|p| p.amount)
        .sum()
}

/// Compute the self-service KPI from one participant's current-year payments.
pub fn participant_kpi(payments: &[Payment], monthly_due: f64, current: &Month) -> ParticipantKpi {
    let confirmed_this_month: f64 = payments
        .iter()
        .filter(|p| p.month == current.as_str() && p.status == PaymentStatus::Confirmed)
        .map(|p| p.amount)
        .sum();

    ParticipantKpi {
        confirmed_year: sum_with_status(payments, PaymentStatus::Confirmed),
        pending_year: sum_with_status(payments, PaymentStatus::Pending),
        remaining_this_month: (monthly_due - confirmed_this_month).max(0.0),
    }
}

/// Month number (within the current year) from which contributions are
/// expected:
/// - started this year: the start month itself;
/// - started earlier: January;
/// - starts in the future: one past the current month, so nothing is
///   expected yet.
fn effective_start_month(start: &Month, current: &Month) -> u32 {
    if start.year() == current.year() {
        start.number()
    } else if start.year() < current.year() {
        1
    } else {
        current.number() + 1
    }
}

/// Compute the admin KPI for one member from their current-year payments.
///
/// Lateness scans every month from the effective start up to but excluding
/// the current month (grace period): a month with no payment row, or whose
/// single row is not confirmed, makes the member late.
pub fn member_kpi(
    participant: &Participant,
    payments: &[Payment],
    monthly_due: f64,
    current: &Month,
) -> MemberKpi {
    let confirmed_year = sum_with_status(payments, PaymentStatus::Confirmed);
    let pending_year = sum_with_status(payments, PaymentStatus::Pending);

    let start = Month::parse(&participant.start_month)
        .unwrap_or_else(|_| Month::from_parts(current.year(), 1));
    let start_number = effective_start_month(&start, current);

    let expected_months = (current.number() as i64 - start_number as i64 + 1).max(0) as f64;
    let expected_total = monthly_due * expected_months;
    let missing = (expected_total - confirmed_year).max(0.0);
    let progress_percent = if expected_total > 0.0 {
        confirmed_year / expected_total * 100.0
    } else {
        0.0
    };

    let is_late = (start_number..current.number()).any(|n| {
        let month = Month::from_parts(current.year(), n);
        !payments
            .iter()
            .any(|p| p.month == month.as_str() && p.status == PaymentStatus::Confirmed)
    });

    MemberKpi {
        participant_id: participant.id,
        name: participant.name.clone(),
        confirmed_year,
        pending_year,
        missing,
        progress_percent,
        is_late,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PaymentMethod;
    use chrono::Utc;

    const EPS: f64 = 1e-9;

    fn participant(start_month: &str) -> Participant {
        Participant {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            active: true,
            start_month: start_month.to_string(),
            created_at: Utc::now(),
        }
    }

    fn payment(month: &str, amount: f64, status: PaymentStatus) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            participant_id: Uuid::new_v4(),
            month: month.to_string(),
            amount,
            method: PaymentMethod::Twint,
            status,
            reason: None,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_participant_kpi_sums_by_status() {
        let current = Month::parse("2026-03").unwrap();
        let payments = vec![
            payment("2026-01", 50.0, PaymentStatus::Confirmed),
            payment("2026-02", 50.0, PaymentStatus::Pending),
            payment("2026-03", 20.0, PaymentStatus::Confirmed),
        ];

        let kpi = participant_kpi(&payments, 50.0, &current);
        assert!((kpi.confirmed_year - 70.0).abs() < EPS);
        assert!((kpi.pending_year - 50.0).abs() < EPS);
        assert!((kpi.remaining_this_month - 30.0).abs() < EPS);
    }

    #[test]
    fn test_remaining_never_negative() {
        let current = Month::parse("2026-03").unwrap();
        let payments = vec![payment("2026-03", 80.0, PaymentStatus::Confirmed)];

        let kpi = participant_kpi(&payments, 50.0, &current);
        assert!((kpi.remaining_this_month - 0.0).abs() < EPS);
    }

    #[test]
    fn test_worked_example_from_the_ledger() {
        // due 50, confirmed 50 in January, nothing since, current month March
        let current = Month::parse("2026-03").unwrap();
        let p = participant("2026-01");
        let payments = vec![payment("2026-01", 50.0, PaymentStatus::Confirmed)];

        let kpi = member_kpi(&p, &payments, 50.0, &current);
        assert!((kpi.confirmed_year - 50.0).abs() < EPS);
        assert!((kpi.missing - 100.0).abs() < EPS);
        assert!((kpi.progress_percent - 100.0 / 3.0).abs() < 0.01);
        assert!(kpi.is_late); // February has no confirmed payment
    }

    #[test]
    fn test_start_this_month_never_late() {
        let current = Month::parse("2026-03").unwrap();
        let p = participant("2026-03");

        let kpi = member_kpi(&p, &[], 50.0, &current);
        // expected_months = 1, nothing paid yet
        assert!((kpi.missing - 50.0).abs() < EPS);
        assert!(!kpi.is_late);
    }

    #[test]
    fn test_future_start_expects_nothing() {
        let current = Month::parse("2026-03").unwrap();
        let p = participant("2027-01");

        let kpi = member_kpi(&p, &[], 50.0, &current);
        assert!((kpi.missing - 0.0).abs() < EPS);
        assert!((kpi.progress_percent - 0.0).abs() < EPS);
        assert!(!kpi.is_late);
    }

    #[test]
    fn test_start_last_year_counts_from_january() {
        let current = Month::parse("2026-02").unwrap();
        let p = participant("2025-06");
        let payments = vec![
            payment("2026-01", 50.0, PaymentStatus::Confirmed),
            payment("2026-02", 50.0, PaymentStatus::Confirmed),
        ];

        let kpi = member_kpi(&p, &payments, 50.0, &current);
        // expected = 2 months, both covered
        assert!((kpi.missing - 0.0).abs() < EPS);
        assert!((kpi.progress_percent - 100.0).abs() < EPS);
        assert!(!kpi.is_late);
    }

    #[test]
    fn test_pending_prior_month_still_counts_as_late() {
        let current = Month::parse("2026-03").unwrap();
        let p = participant("2026-01");
        let payments = vec![
            payment("2026-01", 50.0, PaymentStatus::Confirmed),
            payment("2026-02", 50.0, PaymentStatus::Pending),
        ];

        let kpi = member_kpi(&p, &payments, 50.0, &current);
        assert!(kpi.is_late);
    }

    #[test]
    fn test_current_month_is_grace_period() {
        let current = Month::parse("2026-02").unwrap();
        let p = participant("2026-01");
        // January confirmed, February (current) untouched
        let payments = vec![payment("2026-01", 50.0, PaymentStatus::Confirmed)];

        let kpi = member_kpi(&p, &payments, 50.0, &current);
        assert!(!kpi.is_late);
    }
}
