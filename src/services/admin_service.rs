//! Privileged operations: balance correction, account blocking, and the
//! activity audit trail.

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::admin::{AdjustBalanceRequest, AdjustBalanceResponse, FilterLogs, LogAktivitas};
use crate::models::user::{User, UserResponse};
use crate::models::{page_window, PageMeta, Paginated};
use crate::money::Money;
use crate::services::ledger;
use uuid::Uuid;

/// An adjustment is not a user-initiated debit: going below zero is a
/// bad request, not an out-of-funds condition.
fn adjustment_error(e: AppError) -> AppError {
    match e {
        AppError::InsufficientBalance => AppError::BalanceCannotBeNegative,
        other => other,
    }
}

/// Apply a signed correction to a user's balance.
///
/// Corrections are exempt from the regular per-transaction minimum, but a
/// correction may never take the balance below zero. Runs under the same
/// row lock as every other balance mutation.
pub async fn adjust_balance(
    pool: &DbPool,
    actor_id: Uuid,
    user_id: Uuid,
    request: AdjustBalanceRequest,
) -> Result<AdjustBalanceResponse, AppError> {
    let adjustment: Money = request.amount.parse().map_err(|_| {
        AppError::InvalidRequest(format!("Invalid amount: {:?}", request.amount))
    })?;
    if adjustment == Money::ZERO {
        return Err(AppError::InvalidRequest(
            "Adjustment amount must not be zero".to_string(),
        ));
    }
    let reason = request.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::InvalidRequest(
            "A reason is required for balance adjustments".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    // Same row-locked primitive every balance write uses; only the
    // error vocabulary differs for an admin correction.
    let new_balance = ledger::adjust_balance(&mut *tx, user_id, adjustment)
        .await
        .map_err(adjustment_error)?;

    tx.commit().await?;

    let previous_balance = new_balance
        .checked_sub(adjustment)
        .ok_or_else(|| AppError::InvalidRequest("Amount overflow".to_string()))?;

    tracing::info!(%user_id, %adjustment, %reason, "balance adjusted by admin");
    log_activity(
        pool,
        Some(actor_id),
        &format!("Saldo user {user_id} disesuaikan {adjustment} ({reason})"),
    )
    .await;

    Ok(AdjustBalanceResponse {
        user_id,
        previous_balance,
        adjustment,
        new_balance,
        reason,
    })
}

async fn set_account_status(
    pool: &DbPool,
    actor_id: Uuid,
    user_id: Uuid,
    status: &str,
) -> Result<UserResponse, AppError> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET status_akun = $1, updated_at = NOW()
         WHERE id = $2 AND deleted_at IS NULL
         RETURNING *",
    )
    .bind(status)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::UserNotFound)?;

    log_activity(
        pool,
        Some(actor_id),
        &format!("Status akun user {user_id} diubah menjadi {status}"),
    )
    .await;

    Ok(user.into())
}

/// Block an account. Blocked users keep their balance but cannot move it.
pub async fn block_user(
    pool: &DbPool,
    actor_id: Uuid,
    user_id: Uuid,
) -> Result<UserResponse, AppError> {
    set_account_status(pool, actor_id, user_id, "blocked").await
}

/// Reactivate a blocked account.
pub async fn unblock_user(
    pool: &DbPool,
    actor_id: Uuid,
    user_id: Uuid,
) -> Result<UserResponse, AppError> {
    set_account_status(pool, actor_id, user_id, "active").await
}

/// Append an entry to the activity log.
///
/// Fire-and-forget: a failed log write is reported through tracing and
/// swallowed, it never fails the operation being logged.
pub async fn log_activity(pool: &DbPool, actor_id: Option<Uuid>, aktivitas: &str) {
    let result = sqlx::query("INSERT INTO log_aktivitas (actor_id, aktivitas) VALUES ($1, $2)")
        .bind(actor_id)
        .bind(aktivitas)
        .execute(pool)
        .await;
    if let Err(e) = result {
        tracing::warn!(error = %e, "activity log write failed");
    }
}

/// Paginated activity log, newest first.
pub async fn activity_logs(
    pool: &DbPool,
    filter: FilterLogs,
) -> Result<Paginated<LogAktivitas>, AppError> {
    let (page, limit, offset) = page_window(filter.page, filter.limit);

    let rows = sqlx::query_as::<_, LogAktivitas>(
        "SELECT * FROM log_aktivitas ORDER BY tanggal DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM log_aktivitas")
        .fetch_one(pool)
        .await?;

    Ok(Paginated {
        data: rows,
        meta: PageMeta::new(total, page, limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_result_is_a_bad_request_not_out_of_funds() {
        assert!(matches!(
            adjustment_error(AppError::InsufficientBalance),
            AppError::BalanceCannotBeNegative
        ));
    }

    #[test]
    fn other_adjustment_errors_pass_through() {
        assert!(matches!(
            adjustment_error(AppError::UserNotFound),
            AppError::UserNotFound
        ));
    }
}
