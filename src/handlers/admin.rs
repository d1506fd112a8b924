//! Privileged HTTP handlers, all behind the admin API key middleware.
//!
//! - `POST /api/v1/admin/users/{id}/adjust-balance`
//! - `POST /api/v1/admin/users/{id}/block`
//! - `POST /api/v1/admin/users/{id}/unblock`
//! - `POST /api/v1/admin/ppob/sync-products`
//! - `GET /api/v1/admin/logs`

use crate::{
    error::AppError,
    middleware::auth::AdminContext,
    models::admin::{AdjustBalanceRequest, AdjustBalanceResponse, FilterLogs, LogAktivitas},
    models::user::UserResponse,
    models::Paginated,
    services::{admin_service, ppob_service},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

/// Apply a signed balance correction. Exempt from the per-transaction
/// minimum; still cannot take the balance below zero.
pub async fn adjust_balance(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AdjustBalanceRequest>,
) -> Result<Json<AdjustBalanceResponse>, AppError> {
    let result =
        admin_service::adjust_balance(&state.pool, admin.admin_key_id, user_id, request).await?;
    Ok(Json(result))
}

pub async fn block_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = admin_service::block_user(&state.pool, admin.admin_key_id, user_id).await?;
    Ok(Json(user))
}

pub async fn unblock_user(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = admin_service::unblock_user(&state.pool, admin.admin_key_id, user_id).await?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct SyncProductsRequest {
    /// Margin applied over the aggregator price, in percent.
    #[serde(default)]
    pub margin_percent: f64,
}

/// Pull the aggregator catalog into the local product table.
pub async fn sync_products(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    Json(request): Json<SyncProductsRequest>,
) -> Result<Json<ppob_service::SyncResult>, AppError> {
    if request.margin_percent < 0.0 || request.margin_percent > 100.0 {
        return Err(AppError::InvalidRequest(
            "margin_percent must be between 0 and 100".to_string(),
        ));
    }

    let result =
        ppob_service::sync_products(&state.pool, &state.tripay, request.margin_percent).await?;

    admin_service::log_activity(
        &state.pool,
        Some(admin.admin_key_id),
        &format!(
            "Sinkronisasi produk PPOB: {} berhasil, {} gagal",
            result.synced, result.failed
        ),
    )
    .await;

    Ok(Json(result))
}

/// Paginated activity log, newest first.
pub async fn activity_logs(
    State(state): State<AppState>,
    Query(filter): Query<FilterLogs>,
) -> Result<Json<Paginated<LogAktivitas>>, AppError> {
    let logs = admin_service::activity_logs(&state.pool, filter).await?;
    Ok(Json(logs))
}
