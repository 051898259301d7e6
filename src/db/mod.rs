//! Database Module
//!
//! PostgreSQL access for the contribution ledger. Queries live directly on
//! the `Database` struct; the pool settings and migration handling follow the
//! usual sqlx setup (small pool, fail-fast acquire timeout, embedded
//! migrations).
//!
//! Invariants the schema enforces so handlers do not have to:
//! - `participants.email` is unique;
//! - one non-EXPENSE payment per (participant, month), via a partial unique
//!   index. Concurrent duplicate inserts lose at the index, not at a
//!   read-check.

mod models;

pub use models::*;

use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::error::ApiError;

/// Fields an admin may change on an existing payment. `None` leaves the
/// column untouched.
#[derive(Debug, Default)]
pub struct PaymentUpdate {
    pub amount: Option<f64>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    pub reason: Option<String>,
}

/// Database connection and queries.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect with a small fixed pool.
    ///
    /// - max_connections: 10
    /// - min_connections: 1
    /// - acquire_timeout: 3s
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ============ Participants ============

    pub async fn find_participant(&self, id: Uuid) -> Result<Option<Participant>, ApiError> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    pub async fn find_participant_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Participant>, ApiError> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participant)
    }

    pub async fn list_participants(&self) -> Result<Vec<Participant>, ApiError> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    pub async fn list_active_participants(&self) -> Result<Vec<Participant>, ApiError> {
        let participants = sqlx::query_as::<_, Participant>(
            "SELECT * FROM participants WHERE active ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Fails with a unique violation (mapped to 409) on duplicate email.
    pub async fn insert_participant(&self, p: &Participant) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO participants (id, name, email, password_hash, active, start_month, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(p.id)
        .bind(&p.name)
        .bind(&p.email)
        .bind(&p.password_hash)
        .bind(p.active)
        .bind(&p.start_month)
        .bind(p.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_participant(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
        active: bool,
        start_month: &str,
    ) -> Result<Option<Participant>, ApiError> {
        let updated = sqlx::query_as::<_, Participant>(
            r#"
            UPDATE participants
            SET name = $2, email = $3, active = $4, start_month = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(active)
        .bind(start_month)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("UPDATE participants SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft delete: ledger rows stay attached to the deactivated account.
    pub async fn deactivate_participant(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("UPDATE participants SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of active participants whose email is on the admin allow-list.
    /// Read just before a deactivation to guard the last admin.
    pub async fn count_active_admins(&self, admin_emails: &[String]) -> Result<i64, ApiError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM participants WHERE active AND lower(email) = ANY($1)",
        )
        .bind(admin_emails)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    // ============ Payments ============

    pub async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>, ApiError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    pub async fn list_payments(&self) -> Result<Vec<Payment>, ApiError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments ORDER BY month, recorded_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn payments_for_participant(
        &self,
        participant_id: Uuid,
    ) -> Result<Vec<Payment>, ApiError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE participant_id = $1 ORDER BY month, recorded_at",
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// One participant's payments whose month falls in the given year.
    pub async fn payments_for_participant_year(
        &self,
        participant_id: Uuid,
        year: i32,
    ) -> Result<Vec<Payment>, ApiError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE participant_id = $1 AND month LIKE $2",
        )
        .bind(participant_id)
        .bind(format!("{year:04}-%"))
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Every payment of the given year, across participants. The admin KPI
    /// aggregation groups these in memory instead of issuing one query per
    /// participant.
    pub async fn payments_for_year(&self, year: i32) -> Result<Vec<Payment>, ApiError> {
        let payments = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE month LIKE $1")
            .bind(format!("{year:04}-%"))
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }

    /// Fails with a unique violation (mapped to 409) when a regular payment
    /// already exists for this participant and month.
    pub async fn insert_payment(&self, p: &Payment) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, participant_id, month, amount, method, status, reason, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(p.id)
        .bind(p.participant_id)
        .bind(&p.month)
        .bind(p.amount)
        .bind(p.method)
        .bind(p.status)
        .bind(&p.reason)
        .bind(p.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Partial update; absent fields keep their current value.
    pub async fn update_payment(
        &self,
        id: Uuid,
        update: &PaymentUpdate,
    ) -> Result<Option<Payment>, ApiError> {
        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET amount = COALESCE($2, amount),
                method = COALESCE($3, method),
                status = COALESCE($4, status),
                reason = COALESCE($5, reason)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.amount)
        .bind(update.method)
        .bind(update.status)
        .bind(&update.reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete_payment(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Confirm every pending payment of a month; returns how many changed.
    pub async fn confirm_month(&self, month: &str) -> Result<u64, ApiError> {
        let result = sqlx::query(
            "UPDATE payments SET status = 'confirmed' WHERE month = $1 AND status = 'pending'",
        )
        .bind(month)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Insert an expense split as one transaction: either every share lands
    /// or none does.
    pub async fn insert_payment_batch(&self, payments: &[Payment]) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        for p in payments {
            sqlx::query(
                r#"
                INSERT INTO payments (id, participant_id, month, amount, method, status, reason, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(p.id)
            .bind(p.participant_id)
            .bind(&p.month)
            .bind(p.amount)
            .bind(p.method)
            .bind(p.status)
            .bind(&p.reason)
            .bind(p.recorded_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    // ============ Config ============

    pub async fn list_config(&self) -> Result<Vec<ConfigEntry>, ApiError> {
        let entries = sqlx::query_as::<_, ConfigEntry>("SELECT key, value FROM config ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    pub async fn get_config_value(&self, key: &str) -> Result<Option<String>, ApiError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM config WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(v,)| v))
    }

    pub async fn upsert_config(&self, key: &str, value: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            INSERT INTO config (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Monthly due amount from config; 50 when unset or unparseable.
    pub async fn monthly_due(&self) -> Result<f64, ApiError> {
        Ok(self
            .get_config_value("monthly_due")
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(50.0))
    }

    pub async fn currency(&self) -> Result<String, ApiError> {
        Ok(self
            .get_config_value("currency")
            .await?
            .unwrap_or_else(|| "CHF".to_string()))
    }

    /// Seed the default config mapping; existing keys are left alone.
    pub async fn seed_default_config(&self) -> Result<(), ApiError> {
        for (key, value) in [
            ("monthly_due", "50"),
            ("currency", "CHF"),
            ("title", "Cagnotte"),
        ] {
            sqlx::query("INSERT INTO config (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING")
                .bind(key)
                .bind(value)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}
