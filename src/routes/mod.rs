//! API Routes Module
//!
//! All HTTP endpoint handlers.
//!
//! # Routes
//! - `/health` - health check
//! - `/api/auth/*` - login, current user
//! - `/api/config/*` - key/value configuration
//! - `/api/participants/*` - membership management
//! - `/api/payments/*` - contribution ledger
//! - `/api/expenses` - shared-expense splitting
//! - `/api/kpi/*` - compliance metrics
//! - `/api/export/*` - CSV export
//! - `/api/notifications/*` - payment reminders

pub mod auth;
pub mod config;
pub mod expenses;
pub mod export;
pub mod health;
pub mod kpi;
pub mod notifications;
pub mod participants;
pub mod payments;
