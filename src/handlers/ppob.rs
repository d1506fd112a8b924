//! PPOB HTTP handlers.
//!
//! - `GET /api/v1/ppob/products` - live product catalog
//! - `POST /api/v1/ppob/inquiry` - price check before purchase
//! - `POST /api/v1/ppob/purchase` - buy a product
//! - `GET /api/v1/ppob/status/{reference_id}` - purchase status
//! - `GET /api/v1/ppob/history/{user_id}` - purchase history
//! - `GET /api/v1/ppob/stats/{user_id}` - purchase statistics
//! - `POST /api/v1/ppob/callback` - aggregator callback (HMAC-verified)

use crate::{
    error::AppError,
    models::ppob::{
        CallbackPayload, InquiryRequest, InquiryResponse, PpobStats, PpobTransactionResponse,
        ProductView, PurchaseRequest,
    },
    models::Paginated,
    services::ppob_service,
    AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    #[serde(rename = "type")]
    pub product_type: Option<String>,
}

/// List the aggregator's live catalog, optionally filtered by category.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let products = ppob_service::get_products(&state.tripay, query.product_type.as_deref()).await?;
    Ok(Json(products))
}

/// Price check: resolve a product for a target without touching any
/// state, so a client can show the total before committing.
pub async fn inquiry(
    State(state): State<AppState>,
    Json(request): Json<InquiryRequest>,
) -> Result<Json<InquiryResponse>, AppError> {
    let result = ppob_service::inquiry(&state.pool, &state.tripay, request).await?;
    Ok(Json(result))
}

/// Purchase a product.
///
/// Returns 201 with the finalized record; a purchase the provider
/// rejected synchronously comes back as a `failed` record with the
/// debit already refunded.
pub async fn purchase(
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<PpobTransactionResponse>), AppError> {
    let result = ppob_service::purchase(&state.pool, &state.tripay, request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn check_status(
    State(state): State<AppState>,
    Path(reference_id): Path<String>,
) -> Result<Json<PpobTransactionResponse>, AppError> {
    let result = ppob_service::check_status(&state.pool, &reference_id).await?;
    Ok(Json(result))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Paginated<PpobTransactionResponse>>, AppError> {
    let page = ppob_service::history(&state.pool, user_id, query.page, query.limit).await?;
    Ok(Json(page))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PpobStats>, AppError> {
    let stats = ppob_service::stats(&state.pool, user_id).await?;
    Ok(Json(stats))
}

/// Aggregator callback endpoint.
///
/// The signature is verified over the raw body before anything is
/// deserialized or touched; an unverifiable callback changes no state.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PpobTransactionResponse>, AppError> {
    let signature = headers
        .get("X-Callback-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    if !state.tripay.verify_callback_signature(&body, signature) {
        tracing::warn!("callback rejected: bad signature");
        return Err(AppError::InvalidSignature);
    }

    let payload: CallbackPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidRequest(format!("malformed callback body: {e}")))?;

    let result = ppob_service::handle_callback(&state.pool, payload).await?;
    Ok(Json(result))
}
