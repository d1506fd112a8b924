//! Admin API keys, balance adjustment types, and activity log entries.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An admin API key record.
///
/// Keys are stored as SHA-256 hashes; the auth middleware hashes the
/// presented bearer token and looks the hash up here.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminApiKey {
    pub id: Uuid,
    pub key_hash: String,
    pub admin_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request body for a privileged balance adjustment.
///
/// `amount` is signed and arrives as a string (`"25000"`, `"-1.500"`),
/// parsed through the central Money parser. Admin corrections are exempt
/// from the per-transaction minimum.
#[derive(Debug, Deserialize)]
pub struct AdjustBalanceRequest {
    pub amount: String,
    pub reason: String,
}

/// Result of a balance adjustment, echoing before/after for the audit
/// trail.
#[derive(Debug, Serialize)]
pub struct AdjustBalanceResponse {
    pub user_id: Uuid,
    pub previous_balance: Money,
    pub adjustment: Money,
    pub new_balance: Money,
    pub reason: String,
}

/// An activity log row. Fire-and-forget: writes here never fail the
/// primary operation.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LogAktivitas {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub aktivitas: String,
    pub tanggal: DateTime<Utc>,
}

/// Query parameters for the activity log listing.
#[derive(Debug, Default, Deserialize)]
pub struct FilterLogs {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
