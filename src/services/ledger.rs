//! Ledger primitive: atomic balance read-modify-write.
//!
//! Every balance mutation in the system funnels through
//! [`adjust_balance`]. It always runs inside a caller-owned database
//! transaction and never commits on its own, so multi-entity operations
//! (balance + record, balance + goal progress) commit or roll back as one
//! unit.

use crate::error::AppError;
use crate::money::Money;
use sqlx::PgConnection;
use uuid::Uuid;

/// Apply a signed delta to a user's balance and return the new balance.
///
/// The row is locked with `FOR UPDATE` and the current balance re-read
/// inside the open transaction, so concurrent mutations against the same
/// user serialize instead of losing updates. The non-negativity check
/// runs on that locked read: two concurrent debits can never both pass
/// when their sum exceeds the balance.
///
/// # Errors
///
/// - `UserNotFound`: id does not resolve or the user is soft-deleted
/// - `InsufficientBalance`: the delta would take the balance below zero
pub async fn adjust_balance(
    conn: &mut PgConnection,
    user_id: Uuid,
    delta: Money,
) -> Result<Money, AppError> {
    let saldo: Money = sqlx::query_scalar(
        "SELECT saldo FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::UserNotFound)?;

    let new_saldo = saldo
        .checked_add(delta)
        .ok_or_else(|| AppError::InvalidRequest("Amount overflow".to_string()))?;

    if new_saldo.is_negative() {
        return Err(AppError::InsufficientBalance);
    }

    sqlx::query("UPDATE users SET saldo = $1, updated_at = NOW() WHERE id = $2")
        .bind(new_saldo)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(new_saldo)
}
