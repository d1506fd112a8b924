//! Ledger movement (transaksi) model and API types.

use crate::models::user::UserPublic;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four kinds of ledger movement.
///
/// `setor` and `topup` credit the owner's balance; `tarik` debits it;
/// `transfer` debits the owner and credits the counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Setor,
    Tarik,
    Topup,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Setor => "setor",
            TransactionKind::Tarik => "tarik",
            TransactionKind::Topup => "topup",
            TransactionKind::Transfer => "transfer",
        }
    }

    /// Whether this kind credits the acting user's balance.
    pub fn credits_owner(self) -> bool {
        matches!(self, TransactionKind::Setor | TransactionKind::Topup)
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setor" => Ok(TransactionKind::Setor),
            "tarik" => Ok(TransactionKind::Tarik),
            "topup" => Ok(TransactionKind::Topup),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(format!("unknown transaction kind: {other}")),
        }
    }
}

/// A transaction record from the `transaksi` table.
///
/// Immutable once committed: the table is an append-only audit trail and
/// the application exposes no update path.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Transaksi {
    pub id: Uuid,
    pub jenis: String,
    /// Always positive; direction is carried by `jenis`.
    pub jumlah: Money,
    pub metode: String,
    pub promo: Option<String>,
    pub user_id: Uuid,
    /// Transfer destination, NULL for other kinds.
    pub user_tujuan_id: Option<Uuid>,
    /// Savings goal this movement also applies to, if any.
    pub tabungan_id: Option<Uuid>,
    pub tanggal: DateTime<Utc>,
}

/// Flattened row for list/detail queries that join the owning user.
#[derive(Debug, sqlx::FromRow)]
pub struct TransaksiWithUser {
    pub id: Uuid,
    pub jenis: String,
    pub jumlah: Money,
    pub metode: String,
    pub promo: Option<String>,
    pub user_id: Uuid,
    pub user_tujuan_id: Option<Uuid>,
    pub tabungan_id: Option<Uuid>,
    pub tanggal: DateTime<Utc>,
    pub user_nama: String,
    pub user_email: String,
    pub user_no_hp: Option<String>,
}

/// Request body for creating a transaction.
///
/// The named flows (topup, transfer, goal deposit) are this same request
/// with `jenis` fixed and the optional fields defaulted by the caller.
#[derive(Debug, Deserialize)]
pub struct CreateTransaksiRequest {
    pub jenis: TransactionKind,
    pub jumlah: Money,
    pub metode: String,
    pub promo: Option<String>,
    pub user_id: Uuid,
    pub tabungan_id: Option<Uuid>,
    pub user_tujuan_id: Option<Uuid>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct FilterTransaksi {
    pub jenis: Option<TransactionKind>,
    pub metode: Option<String>,
    pub user_id: Option<Uuid>,
    pub tabungan_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Response body: the persisted record joined with the owner's public
/// fields.
#[derive(Debug, Serialize)]
pub struct TransaksiResponse {
    pub id: Uuid,
    pub jenis: String,
    pub jumlah: Money,
    pub metode: String,
    pub promo: Option<String>,
    pub user_tujuan_id: Option<Uuid>,
    pub tabungan_id: Option<Uuid>,
    pub tanggal: DateTime<Utc>,
    pub user: UserPublic,
}

impl From<TransaksiWithUser> for TransaksiResponse {
    fn from(row: TransaksiWithUser) -> Self {
        Self {
            id: row.id,
            jenis: row.jenis,
            jumlah: row.jumlah,
            metode: row.metode,
            promo: row.promo,
            user_tujuan_id: row.user_tujuan_id,
            tabungan_id: row.tabungan_id,
            tanggal: row.tanggal,
            user: UserPublic {
                id: row.user_id,
                nama: row.user_nama,
                email: row.user_email,
                no_hp: row.user_no_hp,
            },
        }
    }
}

/// Aggregate counters returned by the stats endpoint.
#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct TransaksiStats {
    pub total_transaksi: i64,
    pub total_setor: Money,
    pub total_tarik: Money,
    pub total_topup: Money,
    pub total_transfer: Money,
    pub transaksi_hari_ini: i64,
    pub transaksi_minggu_ini: i64,
    pub transaksi_bulan_ini: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            TransactionKind::Setor,
            TransactionKind::Tarik,
            TransactionKind::Topup,
            TransactionKind::Transfer,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn credit_direction_per_kind() {
        assert!(TransactionKind::Setor.credits_owner());
        assert!(TransactionKind::Topup.credits_owner());
        assert!(!TransactionKind::Tarik.credits_owner());
        assert!(!TransactionKind::Transfer.credits_owner());
    }
}
