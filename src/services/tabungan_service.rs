//! Savings-goal (tabungan) engine.
//!
//! Owns the goal state machine. Deposits and withdrawals are routed
//! through the transaction recorder so that balance, goal progress, and
//! the transaction record always commit in one atomic unit; this module
//! contributes the progress/status transition applied inside that unit.

use crate::error::AppError;
use crate::models::tabungan::{
    CreateTabunganRequest, FilterTabungan, Tabungan, TabunganMovementRequest, TabunganResponse,
    TabunganStatus, UpdateTabunganRequest,
};
use crate::models::transaksi::TransactionKind;
use crate::models::{page_window, PageMeta, Paginated};
use crate::money::Money;
use crate::db::DbPool;
use crate::services::transaksi_service::{self, CreateTransaksi, TransaksiOutcome};
use serde::Serialize;
use sqlx::{PgConnection, QueryBuilder};
use uuid::Uuid;

/// Result of the pure state-machine step: new progress plus the status
/// the goal must transition to.
pub(crate) fn apply_movement(
    progres: Money,
    target: Money,
    jenis: TransactionKind,
    jumlah: Money,
) -> Result<(Money, TabunganStatus), AppError> {
    let new_progres = if jenis.credits_owner() {
        progres
            .checked_add(jumlah)
            .ok_or_else(|| AppError::InvalidRequest("Amount overflow".to_string()))?
    } else {
        // Withdrawal may exceed accumulated progress; the floor is 0.
        progres.saturating_sub_floor_zero(jumlah)
    };

    let status = if new_progres >= target {
        TabunganStatus::Completed
    } else {
        TabunganStatus::Active
    };

    Ok((new_progres, status))
}

/// Apply a deposit/withdrawal to a goal inside the caller's open
/// transaction.
///
/// Locks the goal row, requires it to be `active`, and persists the
/// transition computed by [`apply_movement`]. Completion happens here as
/// a side effect of the deposit that crosses the target.
pub async fn apply_movement_locked(
    conn: &mut PgConnection,
    tabungan_id: Uuid,
    jenis: TransactionKind,
    jumlah: Money,
) -> Result<(), AppError> {
    let row: Option<(Money, Money, String)> = sqlx::query_as(
        "SELECT progres, target, status FROM tabungan
         WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
    )
    .bind(tabungan_id)
    .fetch_optional(&mut *conn)
    .await?;

    let (progres, target, status) = row.ok_or(AppError::TabunganNotFound)?;
    if status != TabunganStatus::Active.as_str() {
        return Err(AppError::TabunganNotActive);
    }

    let (new_progres, new_status) = apply_movement(progres, target, jenis, jumlah)?;

    sqlx::query("UPDATE tabungan SET progres = $1, status = $2, updated_at = NOW() WHERE id = $3")
        .bind(new_progres)
        .bind(new_status.as_str())
        .bind(tabungan_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Create a new goal: active, progress 0.
pub async fn create(
    pool: &DbPool,
    request: CreateTabunganRequest,
) -> Result<TabunganResponse, AppError> {
    let nama = request.nama.trim();
    if nama.len() < 3 || nama.len() > 100 {
        return Err(AppError::InvalidRequest(
            "Tabungan name must be 3-100 characters".to_string(),
        ));
    }
    if request.target < Money::MIN_TABUNGAN_TARGET {
        return Err(AppError::InvalidRequest(format!(
            "Minimum savings target is {}",
            Money::MIN_TABUNGAN_TARGET
        )));
    }

    let user_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)")
            .bind(request.user_id)
            .fetch_one(pool)
            .await?;
    if !user_exists {
        return Err(AppError::UserNotFound);
    }

    let tabungan = sqlx::query_as::<_, Tabungan>(
        r#"
        INSERT INTO tabungan (nama, target, deadline, progres, status, user_id)
        VALUES ($1, $2, $3, 0, 'active', $4)
        RETURNING *
        "#,
    )
    .bind(nama)
    .bind(request.target)
    .bind(request.deadline)
    .bind(request.user_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(tabungan_id = %tabungan.id, user_id = %tabungan.user_id, "tabungan created");
    Ok(tabungan.into())
}

/// Combined outcome of a goal movement: the new goal state, the recorded
/// transaction, and the owner's resulting balance.
#[derive(Debug, Serialize)]
pub struct TabunganMovementOutcome {
    pub tabungan: TabunganResponse,
    #[serde(flatten)]
    pub outcome: TransaksiOutcome,
}

/// Deposit into a goal. Balance credit, progress increment, and the
/// transaction record commit together via the transaction recorder.
pub async fn setor(
    pool: &DbPool,
    tabungan_id: Uuid,
    request: TabunganMovementRequest,
) -> Result<TabunganMovementOutcome, AppError> {
    movement(pool, tabungan_id, TransactionKind::Setor, request).await
}

/// Withdraw from a goal. The debit is checked against the user's balance;
/// progress is clamped at zero.
pub async fn tarik(
    pool: &DbPool,
    tabungan_id: Uuid,
    request: TabunganMovementRequest,
) -> Result<TabunganMovementOutcome, AppError> {
    movement(pool, tabungan_id, TransactionKind::Tarik, request).await
}

async fn movement(
    pool: &DbPool,
    tabungan_id: Uuid,
    jenis: TransactionKind,
    request: TabunganMovementRequest,
) -> Result<TabunganMovementOutcome, AppError> {
    let outcome = transaksi_service::create(
        pool,
        CreateTransaksi {
            jenis,
            jumlah: request.jumlah,
            metode: request.metode.unwrap_or_else(|| "tabungan".to_string()),
            promo: None,
            user_id: request.user_id,
            tabungan_id: Some(tabungan_id),
            user_tujuan_id: None,
        },
    )
    .await?;

    let tabungan = find_one(pool, tabungan_id).await?;
    Ok(TabunganMovementOutcome { tabungan, outcome })
}

pub async fn find_one(pool: &DbPool, id: Uuid) -> Result<TabunganResponse, AppError> {
    let tabungan =
        sqlx::query_as::<_, Tabungan>("SELECT * FROM tabungan WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::TabunganNotFound)?;
    Ok(tabungan.into())
}

pub async fn find_all(
    pool: &DbPool,
    filter: FilterTabungan,
) -> Result<Paginated<TabunganResponse>, AppError> {
    let (page, limit, offset) = page_window(filter.page, filter.limit);

    let mut query = QueryBuilder::new("SELECT * FROM tabungan WHERE deleted_at IS NULL");
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM tabungan WHERE deleted_at IS NULL");
    for builder in [&mut query, &mut count] {
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(user_id) = filter.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(ref search) = filter.search {
            builder
                .push(" AND nama ILIKE ")
                .push_bind(format!("%{search}%"));
        }
    }
    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<Tabungan> = query.build_query_as().fetch_all(pool).await?;
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    Ok(Paginated {
        data: rows.into_iter().map(Into::into).collect(),
        meta: PageMeta::new(total, page, limit),
    })
}

/// Update goal metadata, or administratively override its status
/// (complete/cancel). Progress is never writable through this path.
pub async fn update(
    pool: &DbPool,
    id: Uuid,
    request: UpdateTabunganRequest,
) -> Result<TabunganResponse, AppError> {
    if let Some(ref nama) = request.nama {
        let nama = nama.trim();
        if nama.len() < 3 || nama.len() > 100 {
            return Err(AppError::InvalidRequest(
                "Tabungan name must be 3-100 characters".to_string(),
            ));
        }
    }
    if let Some(target) = request.target {
        if target < Money::MIN_TABUNGAN_TARGET {
            return Err(AppError::InvalidRequest(format!(
                "Minimum savings target is {}",
                Money::MIN_TABUNGAN_TARGET
            )));
        }
    }

    let tabungan = sqlx::query_as::<_, Tabungan>(
        r#"
        UPDATE tabungan
        SET nama = COALESCE($1, nama),
            target = COALESCE($2, target),
            deadline = COALESCE($3, deadline),
            status = COALESCE($4, status),
            updated_at = NOW()
        WHERE id = $5 AND deleted_at IS NULL
        RETURNING *
        "#,
    )
    .bind(request.nama.map(|n| n.trim().to_string()))
    .bind(request.target)
    .bind(request.deadline)
    .bind(request.status.map(TabunganStatus::as_str))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::TabunganNotFound)?;

    Ok(tabungan.into())
}

/// Remove a goal.
///
/// Fails `Forbidden` when `requesting_user_id` is set and does not match
/// the owner. Goals with transaction history are soft-deleted (and
/// cancelled) to preserve the audit trail; goals without history are
/// removed outright.
pub async fn remove(
    pool: &DbPool,
    id: Uuid,
    requesting_user_id: Option<Uuid>,
) -> Result<(), AppError> {
    let tabungan =
        sqlx::query_as::<_, Tabungan>("SELECT * FROM tabungan WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::TabunganNotFound)?;

    if let Some(user_id) = requesting_user_id {
        if user_id != tabungan.user_id {
            return Err(AppError::Forbidden);
        }
    }

    let has_history: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM transaksi WHERE tabungan_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;

    if has_history {
        sqlx::query(
            "UPDATE tabungan SET deleted_at = NOW(), status = 'cancelled', updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
    } else {
        sqlx::query("DELETE FROM tabungan WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_below_target_stays_active() {
        let (progres, status) = apply_movement(
            Money::ZERO,
            Money::new(100_000),
            TransactionKind::Setor,
            Money::new(60_000),
        )
        .unwrap();
        assert_eq!(progres, Money::new(60_000));
        assert_eq!(status, TabunganStatus::Active);
    }

    #[test]
    fn deposit_crossing_target_completes() {
        let (progres, status) = apply_movement(
            Money::new(60_000),
            Money::new(100_000),
            TransactionKind::Setor,
            Money::new(50_000),
        )
        .unwrap();
        assert_eq!(progres, Money::new(110_000));
        assert_eq!(status, TabunganStatus::Completed);
    }

    #[test]
    fn deposit_exactly_at_target_completes() {
        let (progres, status) = apply_movement(
            Money::new(90_000),
            Money::new(100_000),
            TransactionKind::Setor,
            Money::new(10_000),
        )
        .unwrap();
        assert_eq!(progres, Money::new(100_000));
        assert_eq!(status, TabunganStatus::Completed);
    }

    #[test]
    fn withdrawal_beyond_progress_clamps_at_zero() {
        let (progres, status) = apply_movement(
            Money::new(5_000),
            Money::new(100_000),
            TransactionKind::Tarik,
            Money::new(20_000),
        )
        .unwrap();
        assert_eq!(progres, Money::ZERO);
        assert_eq!(status, TabunganStatus::Active);
    }

    #[test]
    fn topup_counts_as_deposit() {
        let (progres, _) = apply_movement(
            Money::ZERO,
            Money::new(100_000),
            TransactionKind::Topup,
            Money::new(25_000),
        )
        .unwrap();
        assert_eq!(progres, Money::new(25_000));
    }

    #[test]
    fn deposit_overflow_is_rejected() {
        let result = apply_movement(
            Money::new(i64::MAX),
            Money::new(100_000),
            TransactionKind::Setor,
            Money::new(1),
        );
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }
}
