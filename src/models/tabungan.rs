//! Savings goal (tabungan) model and API types.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Savings-goal lifecycle states.
///
/// `active -> completed` happens as a side effect of a deposit crossing
/// the target; `cancelled` only via explicit administrative action.
/// Neither terminal state accepts further movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabunganStatus {
    Active,
    Completed,
    Cancelled,
}

impl TabunganStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TabunganStatus::Active => "active",
            TabunganStatus::Completed => "completed",
            TabunganStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for TabunganStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TabunganStatus::Active),
            "completed" => Ok(TabunganStatus::Completed),
            "cancelled" => Ok(TabunganStatus::Cancelled),
            other => Err(format!("unknown tabungan status: {other}")),
        }
    }
}

/// A savings-goal record from the `tabungan` table.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Tabungan {
    pub id: Uuid,
    pub nama: String,
    pub target: Money,
    /// Accumulated progress toward `target`. Clamped at 0, mutated only
    /// inside the same atomic scope as the balance movement that feeds it.
    pub progres: Money,
    pub status: String,
    pub deadline: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Request body for creating a savings goal.
#[derive(Debug, Deserialize)]
pub struct CreateTabunganRequest {
    pub nama: String,
    pub target: Money,
    pub deadline: Option<DateTime<Utc>>,
    pub user_id: Uuid,
}

/// Request body for updating goal metadata or overriding its status.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTabunganRequest {
    pub nama: Option<String>,
    pub target: Option<Money>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<TabunganStatus>,
}

/// Request body for a goal deposit (setor) or withdrawal (tarik).
#[derive(Debug, Deserialize)]
pub struct TabunganMovementRequest {
    pub jumlah: Money,
    pub user_id: Uuid,
    pub metode: Option<String>,
}

/// Query parameters for listing goals.
#[derive(Debug, Default, Deserialize)]
pub struct FilterTabungan {
    pub status: Option<TabunganStatus>,
    pub user_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Response body for goal endpoints.
#[derive(Debug, Serialize)]
pub struct TabunganResponse {
    pub id: Uuid,
    pub nama: String,
    pub target: Money,
    pub progres: Money,
    pub status: String,
    pub deadline: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Tabungan> for TabunganResponse {
    fn from(t: Tabungan) -> Self {
        Self {
            id: t.id,
            nama: t.nama,
            target: t.target,
            progres: t.progres,
            status: t.status,
            deadline: t.deadline,
            user_id: t.user_id,
            created_at: t.created_at,
        }
    }
}
