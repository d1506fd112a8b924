//! Dompet API - digital wallet and bill-payment backend.
//!
//! REST API for user balances (saldo), transaction recording, savings
//! goals (tabungan), and prepaid product purchases (PPOB) through the
//! Tripay aggregator, plus privileged admin operations.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Aggregator**: Tripay over reqwest, HMAC-SHA256 signed
//! - **Admin auth**: API key with SHA-256 hashing
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Build the aggregator client
//! 4. Build the HTTP router and serve

mod clients;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod money;
mod services;

use tracing_subscriber::EnvFilter;

use axum::{
    middleware as axum_middleware, Router,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: db::DbPool,
    pub tripay: clients::tripay::TripayClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controls verbosity, defaulting to "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let tripay = clients::tripay::TripayClient::new(&config)?;
    if config.tripay_sandbox {
        tracing::info!("Tripay client in sandbox mode");
    }

    let state = AppState { pool, tripay };

    // Privileged routes, behind the admin API key middleware
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/users/{id}/adjust-balance",
            post(handlers::admin::adjust_balance),
        )
        .route(
            "/api/v1/admin/users/{id}/block",
            post(handlers::admin::block_user),
        )
        .route(
            "/api/v1/admin/users/{id}/unblock",
            post(handlers::admin::unblock_user),
        )
        .route(
            "/api/v1/admin/ppob/sync-products",
            post(handlers::admin::sync_products),
        )
        .route("/api/v1/admin/logs", get(handlers::admin::activity_logs))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::admin_auth,
        ));

    let app = Router::new()
        // Public routes
        .route("/health", get(handlers::health::health_check))
        // The aggregator authenticates itself via the HMAC signature on
        // the raw body, not via an API key
        .route("/api/v1/ppob/callback", post(handlers::ppob::callback))
        // User management
        .route("/api/v1/users", post(handlers::users::create_user))
        .route("/api/v1/users", get(handlers::users::list_users))
        .route("/api/v1/users/{id}", get(handlers::users::get_user))
        .route("/api/v1/users/{id}", delete(handlers::users::delete_user))
        // Transactions
        .route(
            "/api/v1/transaksi",
            post(handlers::transaksi::create_transaksi),
        )
        .route(
            "/api/v1/transaksi",
            get(handlers::transaksi::list_transaksi),
        )
        .route(
            "/api/v1/transaksi/stats",
            get(handlers::transaksi::transaksi_stats),
        )
        .route(
            "/api/v1/transaksi/{id}",
            get(handlers::transaksi::get_transaksi),
        )
        // Savings goals
        .route("/api/v1/tabungan", post(handlers::tabungan::create_tabungan))
        .route("/api/v1/tabungan", get(handlers::tabungan::list_tabungan))
        .route("/api/v1/tabungan/{id}", get(handlers::tabungan::get_tabungan))
        .route(
            "/api/v1/tabungan/{id}",
            patch(handlers::tabungan::update_tabungan),
        )
        .route(
            "/api/v1/tabungan/{id}",
            delete(handlers::tabungan::delete_tabungan),
        )
        .route(
            "/api/v1/tabungan/{id}/setor",
            post(handlers::tabungan::setor_tabungan),
        )
        .route(
            "/api/v1/tabungan/{id}/tarik",
            post(handlers::tabungan::tarik_tabungan),
        )
        // PPOB
        .route("/api/v1/ppob/products", get(handlers::ppob::list_products))
        .route("/api/v1/ppob/inquiry", post(handlers::ppob::inquiry))
        .route("/api/v1/ppob/purchase", post(handlers::ppob::purchase))
        .route(
            "/api/v1/ppob/status/{reference_id}",
            get(handlers::ppob::check_status),
        )
        .route(
            "/api/v1/ppob/history/{user_id}",
            get(handlers::ppob::history),
        )
        .route("/api/v1/ppob/stats/{user_id}", get(handlers::ppob::stats))
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
