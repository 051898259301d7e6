//! Cagnotte API Library
//!
//! Backend for a recurring monthly contribution pot: participants declare
//! payments, administrators confirm them, split shared expenses and watch
//! compliance KPIs.
//!
//! ## Modules
//!
//! - `config`: environment configuration, loaded once at startup
//! - `error`: API error types and HTTP mapping
//! - `auth`: tokens, password hashing, request extractors
//! - `routes`: HTTP endpoint handlers
//! - `services`: metrics engine, expense splitting, CSV export, email
//! - `db`: PostgreSQL access
//! - `types`: validated newtypes (`Month`)

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::Database;
pub use error::ApiError;
pub use services::EmailService;

/// Application-wide shared state.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    /// Absent when SMTP is not configured; reminder endpoints return 503
    pub mailer: Option<Arc<EmailService>>,
}
