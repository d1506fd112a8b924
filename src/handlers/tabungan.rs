//! Savings-goal HTTP handlers.
//!
//! - `POST /api/v1/tabungan` - create a goal
//! - `GET /api/v1/tabungan` - list with filters
//! - `GET /api/v1/tabungan/{id}` - one goal
//! - `PATCH /api/v1/tabungan/{id}` - update metadata / override status
//! - `DELETE /api/v1/tabungan/{id}` - remove a goal
//! - `POST /api/v1/tabungan/{id}/setor` - deposit into a goal
//! - `POST /api/v1/tabungan/{id}/tarik` - withdraw from a goal

use crate::{
    error::AppError,
    models::tabungan::{
        CreateTabunganRequest, FilterTabungan, TabunganMovementRequest, TabunganResponse,
        UpdateTabunganRequest,
    },
    models::Paginated,
    services::tabungan_service::{self, TabunganMovementOutcome},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

pub async fn create_tabungan(
    State(state): State<AppState>,
    Json(request): Json<CreateTabunganRequest>,
) -> Result<(StatusCode, Json<TabunganResponse>), AppError> {
    let tabungan = tabungan_service::create(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(tabungan)))
}

pub async fn list_tabungan(
    State(state): State<AppState>,
    Query(filter): Query<FilterTabungan>,
) -> Result<Json<Paginated<TabunganResponse>>, AppError> {
    let page = tabungan_service::find_all(&state.pool, filter).await?;
    Ok(Json(page))
}

pub async fn get_tabungan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TabunganResponse>, AppError> {
    let tabungan = tabungan_service::find_one(&state.pool, id).await?;
    Ok(Json(tabungan))
}

pub async fn update_tabungan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTabunganRequest>,
) -> Result<Json<TabunganResponse>, AppError> {
    let tabungan = tabungan_service::update(&state.pool, id, request).await?;
    Ok(Json(tabungan))
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveQuery {
    /// When set, the delete is rejected unless this user owns the goal.
    pub user_id: Option<Uuid>,
}

/// Remove a goal. Goals with movement history are soft-deleted and
/// cancelled; untouched goals are removed outright.
pub async fn delete_tabungan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RemoveQuery>,
) -> Result<StatusCode, AppError> {
    tabungan_service::remove(&state.pool, id, query.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deposit into a goal. Credits the owner's balance and the goal's
/// progress in one atomic unit; crossing the target completes the goal.
pub async fn setor_tabungan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TabunganMovementRequest>,
) -> Result<(StatusCode, Json<TabunganMovementOutcome>), AppError> {
    let outcome = tabungan_service::setor(&state.pool, id, request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Withdraw from a goal. The debit is bounded by the owner's balance;
/// goal progress is clamped at zero.
pub async fn tarik_tabungan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TabunganMovementRequest>,
) -> Result<(StatusCode, Json<TabunganMovementOutcome>), AppError> {
    let outcome = tabungan_service::tarik(&state.pool, id, request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
