//! Transaction HTTP handlers.
//!
//! - `POST /api/v1/transaksi` - record a movement (setor/tarik/topup/transfer)
//! - `GET /api/v1/transaksi` - list with filters
//! - `GET /api/v1/transaksi/stats` - aggregate counters
//! - `GET /api/v1/transaksi/{id}` - one record

use crate::{
    error::AppError,
    models::transaksi::{CreateTransaksiRequest, FilterTransaksi, TransaksiResponse, TransaksiStats},
    models::Paginated,
    services::transaksi_service::{self, CreateTransaksi, TransaksiOutcome},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

/// Record a ledger movement.
///
/// The whole operation (balance debit/credit, counterparty credit on
/// transfer, goal progress, the record itself) commits atomically; the
/// response carries the record plus the actor's new balance.
pub async fn create_transaksi(
    State(state): State<AppState>,
    Json(request): Json<CreateTransaksiRequest>,
) -> Result<(StatusCode, Json<TransaksiOutcome>), AppError> {
    let outcome = transaksi_service::create(
        &state.pool,
        CreateTransaksi {
            jenis: request.jenis,
            jumlah: request.jumlah,
            metode: request.metode,
            promo: request.promo,
            user_id: request.user_id,
            tabungan_id: request.tabungan_id,
            user_tujuan_id: request.user_tujuan_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// List transactions, filterable by kind, method, user, goal, and date
/// range.
pub async fn list_transaksi(
    State(state): State<AppState>,
    Query(filter): Query<FilterTransaksi>,
) -> Result<Json<Paginated<TransaksiResponse>>, AppError> {
    let page = transaksi_service::find_all(&state.pool, filter).await?;
    Ok(Json(page))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub user_id: Option<Uuid>,
}

/// Aggregate statistics, optionally scoped to one user.
pub async fn transaksi_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<TransaksiStats>, AppError> {
    let stats = transaksi_service::stats(&state.pool, query.user_id).await?;
    Ok(Json(stats))
}

/// Get one transaction by id.
pub async fn get_transaksi(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransaksiResponse>, AppError> {
    let transaksi = transaksi_service::find_one(&state.pool, id).await?;
    Ok(Json(transaksi))
}
