//! Database Models
//!
//! Row types for the contribution ledger: participants, their monthly
//! payments and the flat config mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a contribution was (or will be) settled.
///
/// `Expense` marks rows generated by an admin expense split; unlike the
/// regular methods, several expense rows may share one (participant, month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Twint,
    BankTransfer,
    Other,
    Expense,
}

/// Declared by the participant (`Pending`) until an admin validates it
/// (`Confirmed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
}

/// A member of the cagnotte.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: Uuid,

    pub name: String,

    /// Unique; also the admin-list membership key
    pub email: String,

    /// Argon2 hash, never serialized outward
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Soft-delete flag: deactivated participants keep their ledger rows
    pub active: bool,

    /// First month the participant owes a contribution (YYYY-MM)
    pub start_month: String,

    pub created_at: DateTime<Utc>,
}

/// One ledger entry: a monthly contribution or an expense-split share.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,

    pub participant_id: Uuid,

    /// Period the entry belongs to (YYYY-MM)
    pub month: String,

    pub amount: f64,

    pub method: PaymentMethod,

    pub status: PaymentStatus,

    /// Free text; mandatory for expense splits
    pub reason: Option<String>,

    pub recorded_at: DateTime<Utc>,
}

/// Flat key/value configuration row (monthly due amount, currency, title).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}
