//! PPOB purchase engine.
//!
//! Orchestrates a purchase against the external aggregator:
//! validate user + product, atomically debit the balance and record a
//! pending purchase, call the provider outside that atomic scope, then
//! finalize. A synchronous provider failure (including transport errors
//! and timeouts) triggers the compensating refund; asynchronous callbacks
//! reconcile state later through the same refund guard.
//!
//! # Refund idempotency
//!
//! `total_price` is debited exactly once per reference id, and credited
//! back at most once: every compensating credit is conditional on
//! `refunded_at IS NULL`, flipped in the same database transaction that
//! applies the credit. Retried provider callbacks find the flag set and
//! become no-ops.

use crate::clients::tripay::{ProviderConfirmation, TripayClient};
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::ppob::{
    CallbackPayload, InquiryRequest, InquiryResponse, PpobProduct, PpobStats, PpobStatus,
    PpobTransaction, PpobTransactionResponse, ProductView, PurchaseRequest,
};
use crate::models::user::User;
use crate::models::{page_window, PageMeta, Paginated};
use crate::money::Money;
use crate::services::ledger;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Map the provider's status vocabulary onto the internal status set.
/// Unknown statuses are conservatively treated as still pending.
pub(crate) fn map_tripay_status(tripay_status: &str) -> PpobStatus {
    match tripay_status {
        "UNPAID" => PpobStatus::Pending,
        "PAID" => PpobStatus::Success,
        "FAILED" => PpobStatus::Failed,
        "EXPIRED" => PpobStatus::Failed,
        "REFUND" => PpobStatus::Refunded,
        _ => PpobStatus::Pending,
    }
}

/// Decide whether a callback may move the purchase from `current` to
/// `incoming`. `None` means the callback is a no-op (retry or an attempt
/// to leave a terminal state).
///
/// Terminal states accept nothing further, with one exception:
/// `success -> refunded`.
pub(crate) fn callback_transition(
    current: PpobStatus,
    incoming: PpobStatus,
) -> Option<PpobStatus> {
    if incoming == current {
        return None;
    }
    match current {
        PpobStatus::Pending | PpobStatus::Processing => Some(incoming),
        PpobStatus::Success => (incoming == PpobStatus::Refunded).then_some(incoming),
        PpobStatus::Failed | PpobStatus::Refunded => None,
    }
}

/// Whether entering `status` owes the user their money back.
pub(crate) fn refunds_on_entry(status: PpobStatus) -> bool {
    matches!(status, PpobStatus::Failed | PpobStatus::Refunded)
}

/// Whether applying the transition into `next` must credit `total_price`
/// back now. A row whose `refunded_at` is already set has had its credit;
/// asking again is always `false`, so the credit applies exactly once no
/// matter how often a callback is retried.
pub(crate) fn refund_due(
    next: PpobStatus,
    refunded_at: Option<chrono::DateTime<Utc>>,
) -> bool {
    refunds_on_entry(next) && refunded_at.is_none()
}

/// Generate a purchase reference id: `PPOB<unix-millis><4-digit random>`.
///
/// The unique index on `reference_id` is the real collision guard; the
/// purchase flow retries once with a fresh id on a duplicate.
pub(crate) fn generate_reference_id() -> String {
    format!(
        "PPOB{}{:04}",
        Utc::now().timestamp_millis(),
        rand::random_range(0..10_000)
    )
}

fn view_from_tripay(p: &crate::clients::tripay::TripayProduct) -> ProductView {
    ProductView {
        code: p.code.clone(),
        name: p.name.clone(),
        product_type: p.category().to_string(),
        price: Money::new(p.price),
        admin_fee: Money::new(p.admin_fee),
        total_price: Money::new(p.price + p.admin_fee),
        status: if p.buyer_product_status {
            "available".to_string()
        } else {
            "unavailable".to_string()
        },
        stock: p.stock,
    }
}

/// Fetch the live product list, optionally filtered by category.
pub async fn get_products(
    tripay: &TripayClient,
    product_type: Option<&str>,
) -> Result<Vec<ProductView>, AppError> {
    let products = tripay.fetch_products().await?;
    let views = products
        .iter()
        .filter(|p| {
            product_type
                .map(|t| p.category().eq_ignore_ascii_case(t))
                .unwrap_or(true)
        })
        .map(view_from_tripay)
        .collect();
    Ok(views)
}

/// Resolve a product for purchase: local catalog first, live fetch as
/// fallback.
async fn resolve_product(
    pool: &DbPool,
    tripay: &TripayClient,
    product_type: &str,
    product_code: &str,
) -> Result<ProductView, AppError> {
    let local = sqlx::query_as::<_, PpobProduct>("SELECT * FROM ppob_products WHERE code = $1")
        .bind(product_code)
        .fetch_optional(pool)
        .await?;

    if let Some(p) = local {
        if p.status != "active" && p.status != "available" {
            return Err(AppError::ProductUnavailable);
        }
        let total_price = p
            .price
            .checked_add(p.admin_fee)
            .ok_or_else(|| AppError::InvalidRequest("Amount overflow".to_string()))?;
        return Ok(ProductView {
            code: p.code,
            name: p.name,
            product_type: p.product_type,
            price: p.price,
            admin_fee: p.admin_fee,
            total_price,
            status: "available".to_string(),
            stock: p.stock as i64,
        });
    }

    let live = get_products(tripay, Some(product_type)).await?;
    let product = live
        .into_iter()
        .find(|p| p.code == product_code)
        .ok_or(AppError::ProductNotFound)?;
    if product.status != "available" {
        return Err(AppError::ProductUnavailable);
    }
    Ok(product)
}

pub(crate) fn validate_target(target: &str) -> Result<(), AppError> {
    if target.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "A delivery target is required".to_string(),
        ));
    }
    Ok(())
}

/// Price check ahead of a purchase: resolves the product exactly the way
/// [`purchase`] will (`ProductNotFound` / `ProductUnavailable` included)
/// and returns the price breakdown with the echoed target. Pure read.
pub async fn inquiry(
    pool: &DbPool,
    tripay: &TripayClient,
    request: InquiryRequest,
) -> Result<InquiryResponse, AppError> {
    validate_target(&request.target)?;
    let product =
        resolve_product(pool, tripay, &request.product_type, &request.product_code).await?;
    Ok(InquiryResponse {
        target: request.target,
        product,
    })
}

/// Execute a purchase.
///
/// # Process
///
/// 1. Load the user; resolve and validate the product
/// 2. Check `saldo >= total_price` up front (no row is persisted when
///    the balance cannot cover the purchase)
/// 3. Atomically: debit `total_price` and insert the pending purchase
/// 4. Call the provider (outside the storage transaction)
/// 5. Finalize: success, or failed + compensating refund
///
/// The returned view reflects the finalized record.
pub async fn purchase(
    pool: &DbPool,
    tripay: &TripayClient,
    request: PurchaseRequest,
) -> Result<PpobTransactionResponse, AppError> {
    validate_target(&request.target)?;

    let user =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(request.user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::UserNotFound)?;
    if user.status_akun == "blocked" {
        return Err(AppError::AccountBlocked);
    }

    let product =
        resolve_product(pool, tripay, &request.product_type, &request.product_code).await?;
    let total_price = product.total_price;

    if user.saldo < total_price {
        return Err(AppError::InsufficientBalance);
    }

    let email = request.email.clone().or(Some(user.email.clone()));

    // Debit + pending insert in one transaction, retrying once if the
    // generated reference id collides.
    let mut pending = None;
    for attempt in 0..2 {
        let reference_id = generate_reference_id();
        match debit_and_insert_pending(pool, &request, &product, total_price, &reference_id, &email)
            .await
        {
            Ok(row) => {
                pending = Some(row);
                break;
            }
            Err(e) if e.is_unique_violation_on("reference_id") && attempt == 0 => {
                tracing::warn!(reference_id = %reference_id, "reference id collision, retrying");
                continue;
            }
            Err(e) => return Err(e),
        }
    }
    let pending = pending.ok_or_else(|| {
        AppError::Conflict("Could not allocate a unique reference id".to_string())
    })?;

    // Network call outside the atomicity boundary. From here on the user
    // stands debited with a pending record; every outcome below either
    // confirms the purchase or compensates the debit.
    let confirmation = tripay
        .create_transaction(
            &pending.reference_id,
            &product.code,
            &request.target,
            total_price.units(),
            email.as_deref(),
        )
        .await;

    match confirmation {
        Ok(conf) => match map_tripay_status(&conf.status) {
            PpobStatus::Success => finalize_success(pool, pending.id, &conf).await,
            PpobStatus::Failed | PpobStatus::Refunded => {
                finalize_with_refund(
                    pool,
                    pending.id,
                    PpobStatus::Failed,
                    Some(&conf.reference),
                    &conf.status,
                    conf.message.as_deref(),
                )
                .await
            }
            // UNPAID or an unknown status: the provider accepted the
            // order but has not settled it. Record the reference and
            // wait for the callback; a crash here leaves the record
            // pending for the reconciliation path.
            PpobStatus::Pending | PpobStatus::Processing => {
                // Conditional so a callback that already settled the row
                // does not get its provider fields clobbered.
                let row = sqlx::query_as::<_, PpobTransaction>(
                    r#"
                    UPDATE ppob_transactions
                    SET tripay_reference = $1, tripay_status = $2,
                        message = COALESCE($3, message), updated_at = NOW()
                    WHERE id = $4 AND status = 'pending'
                    RETURNING *
                    "#,
                )
                .bind(&conf.reference)
                .bind(&conf.status)
                .bind(conf.message.as_deref())
                .bind(pending.id)
                .fetch_optional(pool)
                .await?;
                match row {
                    Some(row) => Ok(row.into()),
                    None => check_status(pool, &pending.reference_id).await,
                }
            }
        },
        Err(e) => {
            // Transport errors and timeouts count as synchronous
            // failure: compensate now. A late PAID callback will find
            // the record failed and not re-apply anything.
            tracing::warn!(reference_id = %pending.reference_id, error = %e, "provider call failed");
            finalize_with_refund(
                pool,
                pending.id,
                PpobStatus::Failed,
                None,
                "FAILED",
                Some(&e.to_string()),
            )
            .await
        }
    }
}

async fn debit_and_insert_pending(
    pool: &DbPool,
    request: &PurchaseRequest,
    product: &ProductView,
    total_price: Money,
    reference_id: &str,
    email: &Option<String>,
) -> Result<PpobTransaction, AppError> {
    let mut tx = pool.begin().await?;

    // Re-reads the balance under lock; the pre-check above only filters
    // the obvious case early.
    ledger::adjust_balance(&mut *tx, request.user_id, -total_price).await?;

    let row = sqlx::query_as::<_, PpobTransaction>(
        r#"
        INSERT INTO ppob_transactions (
            reference_id, product_code, product_name, product_type, target,
            price, admin_fee, total_price, status, email, user_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10)
        RETURNING *
        "#,
    )
    .bind(reference_id)
    .bind(&product.code)
    .bind(&product.name)
    .bind(&product.product_type)
    .bind(&request.target)
    .bind(product.price)
    .bind(product.admin_fee)
    .bind(total_price)
    .bind(email)
    .bind(request.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

async fn finalize_success(
    pool: &DbPool,
    id: Uuid,
    conf: &ProviderConfirmation,
) -> Result<PpobTransactionResponse, AppError> {
    settle(
        pool,
        id,
        PpobStatus::Success,
        Some(&conf.reference),
        &conf.status,
        conf.sn.as_deref(),
        conf.message.as_deref(),
    )
    .await
}

async fn finalize_with_refund(
    pool: &DbPool,
    id: Uuid,
    new_status: PpobStatus,
    tripay_reference: Option<&str>,
    tripay_status: &str,
    note: Option<&str>,
) -> Result<PpobTransactionResponse, AppError> {
    settle(pool, id, new_status, tripay_reference, tripay_status, None, note).await
}

/// Apply the provider's synchronous outcome to a purchase.
///
/// The asynchronous callback can land between the pending-insert commit
/// and this call, so the row is locked and the outcome goes through the
/// same transition rules the callback path uses: a row the callback
/// already settled stays as the callback left it and is returned as-is.
/// A transition into a refund-owing state credits `total_price` back
/// exactly once, guarded by `refunded_at`.
async fn settle(
    pool: &DbPool,
    id: Uuid,
    outcome: PpobStatus,
    tripay_reference: Option<&str>,
    tripay_status: &str,
    sn: Option<&str>,
    note: Option<&str>,
) -> Result<PpobTransactionResponse, AppError> {
    let mut tx = pool.begin().await?;

    let trx =
        sqlx::query_as::<_, PpobTransaction>("SELECT * FROM ppob_transactions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
    let current: PpobStatus = trx.status.parse().map_err(AppError::InvalidRequest)?;

    let Some(next) = callback_transition(current, outcome) else {
        tx.commit().await?;
        tracing::info!(
            reference_id = %trx.reference_id,
            status = %trx.status,
            "purchase already settled, keeping existing state"
        );
        return Ok(trx.into());
    };

    sqlx::query(
        r#"
        UPDATE ppob_transactions
        SET status = $1, tripay_reference = COALESCE($2, tripay_reference),
            tripay_status = $3, sn = COALESCE($4, sn),
            message = COALESCE($5, message), updated_at = NOW()
        WHERE id = $6
        "#,
    )
    .bind(next.as_str())
    .bind(tripay_reference)
    .bind(tripay_status)
    .bind(sn)
    .bind(note)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if refund_due(next, trx.refunded_at) {
        // Conditional flip backstops the decision above: only the row
        // that sets refunded_at earns the compensating credit.
        let refund: Option<(Uuid, Money)> = sqlx::query_as(
            "UPDATE ppob_transactions SET refunded_at = NOW()
             WHERE id = $1 AND refunded_at IS NULL
             RETURNING user_id, total_price",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((user_id, total_price)) = refund {
            ledger::adjust_balance(&mut *tx, user_id, total_price).await?;
            tracing::info!(reference_id = %trx.reference_id, %total_price, "purchase refunded");
        }
    }

    tx.commit().await?;

    if next == PpobStatus::Success {
        tracing::info!(reference_id = %trx.reference_id, "ppob purchase succeeded");
    }

    // Re-read so the response carries what the guard wrote.
    check_status(pool, &trx.reference_id).await
}

/// Reconcile an asynchronous provider callback.
///
/// Idempotent by `merchant_ref`: retried callbacks and callbacks against
/// terminal states change nothing and return the current view. A
/// transition into `failed`/`refunded` credits `total_price` back exactly
/// once via the `refunded_at` guard.
pub async fn handle_callback(
    pool: &DbPool,
    payload: CallbackPayload,
) -> Result<PpobTransactionResponse, AppError> {
    let incoming = map_tripay_status(&payload.status);

    let mut tx = pool.begin().await?;

    let trx = sqlx::query_as::<_, PpobTransaction>(
        "SELECT * FROM ppob_transactions WHERE reference_id = $1 FOR UPDATE",
    )
    .bind(&payload.merchant_ref)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::TransactionNotFound)?;

    let current: PpobStatus = trx
        .status
        .parse()
        .map_err(AppError::InvalidRequest)?;

    let Some(next) = callback_transition(current, incoming) else {
        tx.commit().await?;
        tracing::info!(
            merchant_ref = %payload.merchant_ref,
            status = %payload.status,
            "callback ignored (no-op transition)"
        );
        return Ok(trx.into());
    };

    sqlx::query(
        r#"
        UPDATE ppob_transactions
        SET status = $1, tripay_reference = $2, tripay_status = $3,
            message = COALESCE($4, message), updated_at = NOW()
        WHERE id = $5
        "#,
    )
    .bind(next.as_str())
    .bind(&payload.reference)
    .bind(&payload.status)
    .bind(payload.note.as_deref())
    .bind(trx.id)
    .execute(&mut *tx)
    .await?;

    if refund_due(next, trx.refunded_at) {
        let refund: Option<(Uuid, Money)> = sqlx::query_as(
            "UPDATE ppob_transactions SET refunded_at = NOW()
             WHERE id = $1 AND refunded_at IS NULL
             RETURNING user_id, total_price",
        )
        .bind(trx.id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((user_id, total_price)) = refund {
            ledger::adjust_balance(&mut *tx, user_id, total_price).await?;
            tracing::info!(merchant_ref = %payload.merchant_ref, %total_price, "callback refund applied");
        }
    }

    tx.commit().await?;
    check_status(pool, &payload.merchant_ref).await
}

/// Look up a purchase by reference id. Pure read.
pub async fn check_status(
    pool: &DbPool,
    reference_id: &str,
) -> Result<PpobTransactionResponse, AppError> {
    let trx = sqlx::query_as::<_, PpobTransaction>(
        "SELECT * FROM ppob_transactions WHERE reference_id = $1",
    )
    .bind(reference_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::TransactionNotFound)?;
    Ok(trx.into())
}

/// A user's purchase history, newest first.
pub async fn history(
    pool: &DbPool,
    user_id: Uuid,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<Paginated<PpobTransactionResponse>, AppError> {
    let (page, limit, offset) = page_window(page, limit);

    let rows = sqlx::query_as::<_, PpobTransaction>(
        "SELECT * FROM ppob_transactions WHERE user_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ppob_transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(Paginated {
        data: rows.into_iter().map(Into::into).collect(),
        meta: PageMeta::new(total, page, limit),
    })
}

/// Per-user purchase statistics.
pub async fn stats(pool: &DbPool, user_id: Uuid) -> Result<PpobStats, AppError> {
    let stats = sqlx::query_as::<_, PpobStats>(
        r#"
        SELECT
            COUNT(*) AS total_transactions,
            COUNT(*) FILTER (WHERE status = 'success') AS success_transactions,
            COUNT(*) FILTER (WHERE created_at >= date_trunc('day', NOW())) AS today_transactions,
            COALESCE(SUM(total_price), 0)::BIGINT AS total_volume
        FROM ppob_transactions
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// Outcome of a catalog sync run.
#[derive(Debug, Serialize)]
pub struct SyncResult {
    pub synced: u32,
    pub failed: u32,
}

/// Compute the local sell price from the aggregator's price and a margin
/// percentage, rounded down to whole units.
pub(crate) fn sell_price(provider_price: i64, margin_percent: f64) -> i64 {
    (provider_price as f64 * (1.0 + margin_percent / 100.0)).floor() as i64
}

/// Upsert the aggregator's catalog into `ppob_products`.
///
/// Per-item failures are counted and logged, never fatal to the run.
pub async fn sync_products(
    pool: &DbPool,
    tripay: &TripayClient,
    margin_percent: f64,
) -> Result<SyncResult, AppError> {
    let products = tripay.fetch_products().await?;

    let mut synced = 0u32;
    let mut failed = 0u32;
    for item in &products {
        let status = if item.buyer_product_status {
            "active"
        } else {
            "unavailable"
        };
        let result = sqlx::query(
            r#"
            INSERT INTO ppob_products (code, name, type, price, admin_fee, stock, status, provider)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'tripay')
            ON CONFLICT (code) DO UPDATE
            SET name = EXCLUDED.name, type = EXCLUDED.type, price = EXCLUDED.price,
                admin_fee = EXCLUDED.admin_fee, stock = EXCLUDED.stock,
                status = EXCLUDED.status, updated_at = NOW()
            "#,
        )
        .bind(&item.code)
        .bind(&item.name)
        .bind(item.category())
        .bind(sell_price(item.price, margin_percent))
        .bind(item.admin_fee)
        .bind(item.stock as i32)
        .bind(status)
        .execute(pool)
        .await;

        match result {
            Ok(_) => synced += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(code = %item.code, error = %e, "product sync failed");
            }
        }
    }

    tracing::info!(synced, failed, "product catalog synced");
    Ok(SyncResult { synced, failed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_statuses_map_to_internal_vocabulary() {
        assert_eq!(map_tripay_status("UNPAID"), PpobStatus::Pending);
        assert_eq!(map_tripay_status("PAID"), PpobStatus::Success);
        assert_eq!(map_tripay_status("FAILED"), PpobStatus::Failed);
        assert_eq!(map_tripay_status("EXPIRED"), PpobStatus::Failed);
        assert_eq!(map_tripay_status("REFUND"), PpobStatus::Refunded);
        assert_eq!(map_tripay_status("SOMETHING_NEW"), PpobStatus::Pending);
    }

    #[test]
    fn pending_accepts_any_settlement() {
        assert_eq!(
            callback_transition(PpobStatus::Pending, PpobStatus::Success),
            Some(PpobStatus::Success)
        );
        assert_eq!(
            callback_transition(PpobStatus::Pending, PpobStatus::Failed),
            Some(PpobStatus::Failed)
        );
    }

    #[test]
    fn retried_callback_is_a_no_op() {
        assert_eq!(
            callback_transition(PpobStatus::Failed, PpobStatus::Failed),
            None
        );
        assert_eq!(
            callback_transition(PpobStatus::Success, PpobStatus::Success),
            None
        );
    }

    #[test]
    fn terminal_states_only_allow_success_to_refunded() {
        assert_eq!(
            callback_transition(PpobStatus::Success, PpobStatus::Refunded),
            Some(PpobStatus::Refunded)
        );
        assert_eq!(
            callback_transition(PpobStatus::Success, PpobStatus::Failed),
            None
        );
        assert_eq!(
            callback_transition(PpobStatus::Failed, PpobStatus::Success),
            None
        );
        assert_eq!(
            callback_transition(PpobStatus::Refunded, PpobStatus::Success),
            None
        );
    }

    #[test]
    fn refund_is_owed_on_failed_and_refunded_only() {
        assert!(refunds_on_entry(PpobStatus::Failed));
        assert!(refunds_on_entry(PpobStatus::Refunded));
        assert!(!refunds_on_entry(PpobStatus::Success));
        assert!(!refunds_on_entry(PpobStatus::Pending));
    }

    #[test]
    fn refund_is_credited_exactly_once() {
        // first transition into a refund-owing state credits
        assert!(refund_due(PpobStatus::Failed, None));
        assert!(refund_due(PpobStatus::Refunded, None));
        // a row that already carries its refund never credits again,
        // however often the same callback is redelivered
        let already = Some(Utc::now());
        assert!(!refund_due(PpobStatus::Failed, already));
        assert!(!refund_due(PpobStatus::Refunded, already));
        // non-refund states never credit
        assert!(!refund_due(PpobStatus::Success, None));
        assert!(!refund_due(PpobStatus::Pending, None));
    }

    #[test]
    fn settled_purchase_is_not_overwritten_by_late_provider_outcome() {
        // provider call timed out on our side, but its PAID callback
        // landed first: the late synchronous failure must not flip the
        // row back and must not owe a refund
        assert_eq!(
            callback_transition(PpobStatus::Success, PpobStatus::Failed),
            None
        );
        assert!(!refund_due(PpobStatus::Success, None));

        // mirror: FAILED callback already settled and refunded the row;
        // a late success report changes nothing
        assert_eq!(
            callback_transition(PpobStatus::Failed, PpobStatus::Success),
            None
        );
        assert!(!refund_due(PpobStatus::Failed, Some(Utc::now())));
    }

    #[test]
    fn inquiry_and_purchase_require_a_target() {
        assert!(matches!(
            validate_target("  "),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(validate_target("081234567890").is_ok());
    }

    #[test]
    fn reference_ids_have_the_expected_shape() {
        let id = generate_reference_id();
        assert!(id.starts_with("PPOB"));
        assert!(id.len() >= 4 + 13 + 4);
        assert!(id[4..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn sell_price_applies_margin_rounding_down() {
        assert_eq!(sell_price(10_000, 0.0), 10_000);
        assert_eq!(sell_price(10_000, 5.0), 10_500);
        assert_eq!(sell_price(9_999, 2.5), 10_248);
    }
}
