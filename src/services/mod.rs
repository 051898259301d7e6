//! Services Module
//!
//! Business logic behind the HTTP handlers.
//!
//! # Services
//! - `metrics`: per-participant and admin KPI aggregation (pure)
//! - `split`: cash rounding and expense-share computation (pure)
//! - `export`: CSV rendering of ledger rows (pure)
//! - `email`: SMTP notifications fed by the metrics engine

pub mod email;
pub mod export;
pub mod metrics;
pub mod split;

pub use email::{EmailService, MonthlySummary};
pub use metrics::{member_kpi, participant_kpi, MemberKpi, ParticipantKpi};
pub use split::{compute_shares, round_up_to_nearest, SplitMode};
