//! CSV Export
//!
//! Plain textual rendering of ledger rows. Amounts are fixed to two
//! decimals; commas inside the free-text reason are replaced with
//! semicolons so the column count stays fixed without quoting rules.

use std::collections::HashMap;

use uuid::Uuid;

use crate::db::{Payment, PaymentMethod, PaymentStatus};

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Twint => "TWINT",
        PaymentMethod::BankTransfer => "BANK_TRANSFER",
        PaymentMethod::Other => "OTHER",
        PaymentMethod::Expense => "EXPENSE",
    }
}

fn status_label(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Confirmed => "confirmed",
    }
}

fn sanitized_reason(payment: &Payment) -> String {
    payment
        .reason
        .as_deref()
        .unwrap_or("")
        .replace(',', ";")
}

/// One participant's payments, unsorted (callers pass rows already ordered
/// by the ledger query).
pub fn participant_csv(payments: &[Payment]) -> String {
    let mut lines = vec!["Month,Amount,Method,Status,Date,Reason".to_string()];
    for p in payments {
        lines.push(format!(
            "{},{:.2},{},{},{},{}",
            p.month,
            p.amount,
            method_label(p.method),
            status_label(p.status),
            p.recorded_at.to_rfc3339(),
            sanitized_reason(p),
        ));
    }
    lines.join("\n")
}

/// Every payment with the owning participant's name, sorted by
/// (month, recorded_at) ascending. Dangling participant ids render as
/// "Unknown".
pub fn full_csv(payments: &[Payment], names: &HashMap<Uuid, String>) -> String {
    let mut sorted: Vec<&Payment> = payments.iter().collect();
    sorted.sort_by(|a, b| (&a.month, a.recorded_at).cmp(&(&b.month, b.recorded_at)));

    let mut lines = vec!["Participant,Month,Amount,Method,Status,Date,Reason".to_string()];
    for p in sorted {
        let name = names
            .get(&p.participant_id)
            .map(String::as_str)
            .unwrap_or("Unknown");
        lines.push(format!(
            "{},{},{:.2},{},{},{},{}",
            name,
            p.month,
            p.amount,
            method_label(p.method),
            status_label(p.status),
            p.recorded_at.to_rfc3339(),
            sanitized_reason(p),
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn payment(participant_id: Uuid, month: &str, reason: Option<&str>) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            participant_id,
            month: month.to_string(),
            amount: 50.0,
            method: PaymentMethod::Twint,
            status: PaymentStatus::Confirmed,
            reason: reason.map(String::from),
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_participant_csv_header_and_row() {
        let csv = participant_csv(&[payment(Uuid::new_v4(), "2026-01", None)]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Month,Amount,Method,Status,Date,Reason");
        assert!(lines[1].starts_with("2026-01,50.00,TWINT,confirmed,"));
    }

    #[test]
    fn test_amounts_render_with_two_decimals() {
        let mut p = payment(Uuid::new_v4(), "2026-03", None);
        p.amount = 33.35;
        let csv = participant_csv(&[p]);
        assert!(csv.lines().nth(1).unwrap().starts_with("2026-03,33.35,"));

        let mut q = payment(Uuid::new_v4(), "2026-03", None);
        q.amount = 7.5;
        let names: HashMap<Uuid, String> =
            [(q.participant_id, "Alice".to_string())].into_iter().collect();
        let csv = full_csv(&[q], &names);
        assert!(csv.lines().nth(1).unwrap().starts_with("Alice,2026-03,7.50,"));
    }

    #[test]
    fn test_reason_commas_become_semicolons() {
        let csv = participant_csv(&[payment(Uuid::new_v4(), "2026-01", Some("pizza, drinks"))]);
        assert!(csv.contains("pizza; drinks"));
        // Still exactly 6 columns
        assert_eq!(csv.lines().nth(1).unwrap().split(',').count(), 6);
    }

    #[test]
    fn test_full_csv_sorted_and_named() {
        let id = Uuid::new_v4();
        let names: HashMap<Uuid, String> = [(id, "Alice".to_string())].into_iter().collect();

        let mut february = payment(id, "2026-02", None);
        let mut january = payment(id, "2026-01", None);
        february.recorded_at = Utc::now() - Duration::days(1);
        january.recorded_at = Utc::now();

        // Passed out of order and with a later timestamp on the earlier
        // month; the month key wins.
        let csv = full_csv(&[february, january], &names);
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].starts_with("Alice,2026-01"));
        assert!(lines[2].starts_with("Alice,2026-02"));
    }

    #[test]
    fn test_full_csv_unknown_participant() {
        let csv = full_csv(&[payment(Uuid::new_v4(), "2026-01", None)], &HashMap::new());
        assert!(csv.lines().nth(1).unwrap().starts_with("Unknown,"));
    }
}
