//! Cagnotte API Server
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client (Frontend)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum Web Server                         │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                      Routes Layer                        ││
//! │  │  /health  /api/auth/*  /api/payments/*  /api/kpi/*      ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Services Layer                        ││
//! │  │  Metrics Engine    Expense Split    CSV Export    Email ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Data Layer                            ││
//! │  │  PostgreSQL (participants, payments, config)            ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use cagnotte_api::{auth, db::Participant, routes, types::Month, AppState, Config, Database, EmailService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG=debug,sqlx=warn style level control
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cagnotte_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Cagnotte API Server");

    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded ({} admin emails)", config.admin_emails.len());

    let db = Database::connect(&config.database_url).await?;
    tracing::info!("🗄️  Database connected");

    db.run_migrations().await?;
    tracing::info!("📦 Migrations completed");

    seed_defaults(&db, &config).await?;

    let mailer = match &config.smtp {
        Some(smtp) => {
            let service = EmailService::new(smtp)?;
            tracing::info!("✉️  Email service enabled ({})", smtp.host);
            Some(Arc::new(service))
        }
        None => {
            tracing::info!("✉️  Email service disabled (no SMTP configuration)");
            None
        }
    };

    let state = AppState {
        db: Arc::new(db),
        config: Arc::new(config.clone()),
        mailer,
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed the default config mapping and the bootstrap admin account so a
/// fresh database is usable immediately.
async fn seed_defaults(db: &Database, config: &Config) -> anyhow::Result<()> {
    db.seed_default_config().await?;

    let existing = db
        .find_participant_by_email(&config.bootstrap_admin_email)
        .await?;

    if existing.is_none() {
        let admin = Participant {
            id: Uuid::new_v4(),
            name: "Administrator".to_string(),
            email: config.bootstrap_admin_email.to_lowercase(),
            password_hash: auth::hash_password(&config.bootstrap_admin_password)?,
            active: true,
            start_month: Month::current().as_str().to_string(),
            created_at: Utc::now(),
        };
        db.insert_participant(&admin).await?;
        tracing::info!("👤 Bootstrap admin created: {}", admin.email);
    }

    Ok(())
}

/// Build the router.
///
/// # Route Structure
///
/// ```text
/// GET  /health                           - server status
///
/// POST /api/auth/login                   - email+password -> token
/// GET  /api/auth/me                      - authenticated participant
///
/// GET  /api/config                       - list configuration
/// PUT  /api/config/:key                  - upsert (admin)
///
/// GET  /api/participants                 - list (admin)
/// POST /api/participants                 - create (admin)
/// PUT  /api/participants/:id             - update (admin)
/// PUT  /api/participants/:id/password    - change password (self/admin)
/// DELETE /api/participants/:id           - soft delete (admin)
///
/// GET  /api/payments                     - own payments
/// GET  /api/payments/all                 - all payments (admin)
/// POST /api/payments                     - self-declare (pending)
/// PUT  /api/payments/:id                 - update (admin)
/// DELETE /api/payments/:id               - delete (admin)
/// POST /api/payments/confirm-month       - bulk confirm (admin)
///
/// POST /api/expenses                     - expense split (admin)
///
/// GET  /api/kpi/participant              - self KPI
/// GET  /api/kpi/admin                    - per-member KPI (admin)
///
/// POST /api/notifications/reminders      - mail late participants (admin)
/// POST /api/notifications/summary        - mail aggregate summary (admin)
///
/// GET  /api/export/csv/:participant_id   - CSV (self/admin)
/// GET  /api/export/csv-all               - CSV (admin)
/// ```
fn create_router(state: AppState) -> Router {
    let cors = if state.config.is_production() {
        let allowed_origins =
            std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "https://yourdomain.com".to_string());
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/me", get(routes::auth::me))
        // Config
        .route("/api/config", get(routes::config::list_config))
        .route("/api/config/:key", put(routes::config::update_config))
        // Participants
        .route("/api/participants", get(routes::participants::list_participants))
        .route("/api/participants", post(routes::participants::create_participant))
        .route("/api/participants/:id", put(routes::participants::update_participant))
        .route(
            "/api/participants/:id/password",
            put(routes::participants::change_password),
        )
        .route(
            "/api/participants/:id",
            delete(routes::participants::delete_participant),
        )
        // Payments
        .route("/api/payments", get(routes::payments::list_own_payments))
        .route("/api/payments/all", get(routes::payments::list_all_payments))
        .route("/api/payments", post(routes::payments::create_payment))
        .route("/api/payments/:id", put(routes::payments::update_payment))
        .route("/api/payments/:id", delete(routes::payments::delete_payment))
        .route("/api/payments/confirm-month", post(routes::payments::confirm_month))
        // Expenses
        .route("/api/expenses", post(routes::expenses::create_expense))
        // KPI
        .route("/api/kpi/participant", get(routes::kpi::participant_kpis))
        .route("/api/kpi/admin", get(routes::kpi::admin_kpis))
        // Notifications
        .route(
            "/api/notifications/reminders",
            post(routes::notifications::send_reminders),
        )
        .route(
            "/api/notifications/summary",
            post(routes::notifications::send_summary),
        )
        // Export
        .route(
            "/api/export/csv/:participant_id",
            get(routes::export::export_participant_csv),
        )
        .route("/api/export/csv-all", get(routes::export::export_full_csv))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State injection
        .with_state(state)
}
