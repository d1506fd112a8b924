//! Transaction recorder - core business logic for ledger movements.
//!
//! Every user-initiated money movement (setor, tarik, topup, transfer,
//! goal deposit/withdrawal) is one call to [`create`]: validation up
//! front, then a single database transaction covering the balance
//! mutation(s), the optional savings-goal progress update, and the
//! insert of the immutable transaksi record.
//!
//! # Atomicity Guarantees
//!
//! All sub-mutations happen within one PostgreSQL transaction. The
//! database ensures all-or-nothing execution: an error anywhere before
//! commit rolls everything back, so a debit can never persist without
//! its record.

use crate::db::DbPool;
use crate::error::AppError;
use crate::models::transaksi::{
    FilterTransaksi, TransactionKind, Transaksi, TransaksiResponse, TransaksiStats,
    TransaksiWithUser,
};
use crate::models::user::UserPublic;
use crate::models::{page_window, PageMeta, Paginated};
use crate::money::Money;
use crate::services::{ledger, tabungan_service};
use serde::Serialize;
use sqlx::QueryBuilder;
use uuid::Uuid;

/// Input for recording a transaction. The named API flows are this same
/// input with `jenis` fixed and defaults applied by the caller.
#[derive(Debug, Clone)]
pub struct CreateTransaksi {
    pub jenis: TransactionKind,
    pub jumlah: Money,
    pub metode: String,
    pub promo: Option<String>,
    pub user_id: Uuid,
    pub tabungan_id: Option<Uuid>,
    pub user_tujuan_id: Option<Uuid>,
}

/// The persisted record plus the acting user's new balance.
#[derive(Debug, Serialize)]
pub struct TransaksiOutcome {
    pub transaksi: TransaksiResponse,
    pub saldo: Money,
}

/// Stateless request validation, run before anything touches storage.
pub(crate) fn validate(input: &CreateTransaksi) -> Result<(), AppError> {
    if input.jumlah < Money::MIN_TRANSAKSI {
        return Err(AppError::InvalidRequest(format!(
            "Minimum transaction amount is {}",
            Money::MIN_TRANSAKSI
        )));
    }
    if input.metode.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Payment method is required".to_string(),
        ));
    }
    if input.jenis == TransactionKind::Transfer {
        match input.user_tujuan_id {
            None => {
                return Err(AppError::InvalidRequest(
                    "Transfer requires a destination user".to_string(),
                ));
            }
            Some(tujuan) if tujuan == input.user_id => {
                return Err(AppError::InvalidRequest(
                    "Cannot transfer to your own account".to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Record a transaction.
///
/// # Process
///
/// 1. Validate the request (minimum amount, transfer rules)
/// 2. Verify goal ownership / counterparty existence
/// 3. Start a database transaction
/// 4. Lock and mutate the acting user's balance (and the counterparty's
///    on transfer), apply goal progress if a tabungan is attached
/// 5. Insert the transaksi record
/// 6. Commit (or roll back on any error)
///
/// # Errors
///
/// - `InvalidRequest`: amount below minimum, self-transfer, missing fields
/// - `UserNotFound` / `TabunganNotFound` / `Forbidden`: references invalid
/// - `AccountBlocked`: a blocked account cannot move funds
/// - `InsufficientBalance`: debit exceeds the locked balance
pub async fn create(pool: &DbPool, input: CreateTransaksi) -> Result<TransaksiOutcome, AppError> {
    validate(&input)?;

    let status_akun: String =
        sqlx::query_scalar("SELECT status_akun FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(input.user_id)
            .fetch_optional(pool)
            .await?
            .ok_or(AppError::UserNotFound)?;
    if status_akun == "blocked" {
        return Err(AppError::AccountBlocked);
    }

    if let Some(tabungan_id) = input.tabungan_id {
        let owner: Option<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM tabungan WHERE id = $1 AND deleted_at IS NULL")
                .bind(tabungan_id)
                .fetch_optional(pool)
                .await?;
        match owner {
            None => return Err(AppError::TabunganNotFound),
            Some(owner) if owner != input.user_id => return Err(AppError::Forbidden),
            Some(_) => {}
        }
    }

    if let Some(tujuan) = input.user_tujuan_id {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(tujuan)
        .fetch_one(pool)
        .await?;
        if !exists {
            return Err(AppError::UserNotFound);
        }
    }

    let mut tx = pool.begin().await?;

    // Lock and mutate the source balance. The balance is re-read under
    // the lock inside this transaction, never from a stale copy, so
    // concurrent debits against one user serialize.
    let delta = if input.jenis.credits_owner() {
        input.jumlah
    } else {
        -input.jumlah
    };
    let saldo = ledger::adjust_balance(&mut *tx, input.user_id, delta).await?;

    // Transfer credits the counterparty in the same atomic scope.
    // Lock order is source then destination, matching the debit path.
    if input.jenis == TransactionKind::Transfer {
        if let Some(tujuan) = input.user_tujuan_id {
            ledger::adjust_balance(&mut *tx, tujuan, input.jumlah).await?;
        }
    }

    if let Some(tabungan_id) = input.tabungan_id {
        tabungan_service::apply_movement_locked(&mut *tx, tabungan_id, input.jenis, input.jumlah)
            .await?;
    }

    let transaksi = sqlx::query_as::<_, Transaksi>(
        r#"
        INSERT INTO transaksi (jenis, jumlah, metode, promo, user_id, user_tujuan_id, tabungan_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(input.jenis.as_str())
    .bind(input.jumlah)
    .bind(&input.metode)
    .bind(&input.promo)
    .bind(input.user_id)
    .bind(input.user_tujuan_id)
    .bind(input.tabungan_id)
    .fetch_one(&mut *tx)
    .await?;

    let user = sqlx::query_as::<_, UserPublic>(
        "SELECT id, nama, email, no_hp FROM users WHERE id = $1",
    )
    .bind(input.user_id)
    .fetch_one(&mut *tx)
    .await?;

    // Commit all changes atomically.
    tx.commit().await?;

    tracing::info!(
        transaksi_id = %transaksi.id,
        jenis = %transaksi.jenis,
        jumlah = %transaksi.jumlah,
        user_id = %transaksi.user_id,
        "transaksi recorded"
    );

    Ok(TransaksiOutcome {
        transaksi: TransaksiResponse {
            id: transaksi.id,
            jenis: transaksi.jenis,
            jumlah: transaksi.jumlah,
            metode: transaksi.metode,
            promo: transaksi.promo,
            user_tujuan_id: transaksi.user_tujuan_id,
            tabungan_id: transaksi.tabungan_id,
            tanggal: transaksi.tanggal,
            user,
        },
        saldo,
    })
}

const SELECT_WITH_USER: &str = "SELECT t.id, t.jenis, t.jumlah, t.metode, t.promo, t.user_id, \
     t.user_tujuan_id, t.tabungan_id, t.tanggal, \
     u.nama AS user_nama, u.email AS user_email, u.no_hp AS user_no_hp \
     FROM transaksi t JOIN users u ON u.id = t.user_id WHERE 1=1";

/// List transactions with filtering and pagination.
pub async fn find_all(
    pool: &DbPool,
    filter: FilterTransaksi,
) -> Result<Paginated<TransaksiResponse>, AppError> {
    let (page, limit, offset) = page_window(filter.page, filter.limit);

    let mut query = QueryBuilder::new(SELECT_WITH_USER);
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM transaksi t WHERE 1=1");
    for builder in [&mut query, &mut count] {
        if let Some(jenis) = filter.jenis {
            builder.push(" AND t.jenis = ").push_bind(jenis.as_str());
        }
        if let Some(ref metode) = filter.metode {
            builder.push(" AND t.metode = ").push_bind(metode.clone());
        }
        if let Some(user_id) = filter.user_id {
            builder.push(" AND t.user_id = ").push_bind(user_id);
        }
        if let Some(tabungan_id) = filter.tabungan_id {
            builder.push(" AND t.tabungan_id = ").push_bind(tabungan_id);
        }
        if let Some(start) = filter.start_date {
            builder.push(" AND t.tanggal >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            builder.push(" AND t.tanggal <= ").push_bind(end);
        }
    }
    query
        .push(" ORDER BY t.tanggal DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<TransaksiWithUser> = query.build_query_as().fetch_all(pool).await?;
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    Ok(Paginated {
        data: rows.into_iter().map(Into::into).collect(),
        meta: PageMeta::new(total, page, limit),
    })
}

/// Get one transaction joined with its owner.
pub async fn find_one(pool: &DbPool, id: Uuid) -> Result<TransaksiResponse, AppError> {
    let mut query = QueryBuilder::new(SELECT_WITH_USER);
    query.push(" AND t.id = ").push_bind(id);

    let row: Option<TransaksiWithUser> = query.build_query_as().fetch_optional(pool).await?;
    row.map(Into::into).ok_or(AppError::TransactionNotFound)
}

/// Aggregate statistics, optionally scoped to one user.
pub async fn stats(pool: &DbPool, user_id: Option<Uuid>) -> Result<TransaksiStats, AppError> {
    let stats = sqlx::query_as::<_, TransaksiStats>(
        r#"
        SELECT
            COUNT(*) AS total_transaksi,
            COALESCE(SUM(jumlah) FILTER (WHERE jenis = 'setor'), 0)::BIGINT AS total_setor,
            COALESCE(SUM(jumlah) FILTER (WHERE jenis = 'tarik'), 0)::BIGINT AS total_tarik,
            COALESCE(SUM(jumlah) FILTER (WHERE jenis = 'topup'), 0)::BIGINT AS total_topup,
            COALESCE(SUM(jumlah) FILTER (WHERE jenis = 'transfer'), 0)::BIGINT AS total_transfer,
            COUNT(*) FILTER (WHERE tanggal >= date_trunc('day', NOW())) AS transaksi_hari_ini,
            COUNT(*) FILTER (WHERE tanggal >= NOW() - INTERVAL '7 days') AS transaksi_minggu_ini,
            COUNT(*) FILTER (WHERE tanggal >= date_trunc('month', NOW())) AS transaksi_bulan_ini
        FROM transaksi
        WHERE ($1::uuid IS NULL OR user_id = $1)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> CreateTransaksi {
        CreateTransaksi {
            jenis: TransactionKind::Setor,
            jumlah: Money::new(20_000),
            metode: "cash".to_string(),
            promo: None,
            user_id: Uuid::new_v4(),
            tabungan_id: None,
            user_tujuan_id: None,
        }
    }

    #[test]
    fn rejects_amount_below_minimum() {
        let input = CreateTransaksi {
            jumlah: Money::new(999),
            ..base_input()
        };
        assert!(matches!(
            validate(&input),
            Err(AppError::InvalidRequest(_))
        ));
        let input = CreateTransaksi {
            jumlah: Money::new(1_000),
            ..base_input()
        };
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn rejects_self_transfer_before_any_mutation() {
        let user_id = Uuid::new_v4();
        let input = CreateTransaksi {
            jenis: TransactionKind::Transfer,
            user_id,
            user_tujuan_id: Some(user_id),
            ..base_input()
        };
        assert!(matches!(
            validate(&input),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn transfer_requires_destination() {
        let input = CreateTransaksi {
            jenis: TransactionKind::Transfer,
            user_tujuan_id: None,
            ..base_input()
        };
        assert!(matches!(
            validate(&input),
            Err(AppError::InvalidRequest(_))
        ));

        let input = CreateTransaksi {
            jenis: TransactionKind::Transfer,
            user_tujuan_id: Some(Uuid::new_v4()),
            ..base_input()
        };
        assert!(validate(&input).is_ok());
    }

    #[test]
    fn rejects_blank_method() {
        let input = CreateTransaksi {
            metode: "  ".to_string(),
            ..base_input()
        };
        assert!(matches!(
            validate(&input),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
