//! PPOB purchase and product catalog models.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// PPOB purchase lifecycle states.
///
/// `pending -> success | failed`; `success -> refunded` via callback.
/// Terminal states accept no further callbacks except that refund
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PpobStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Refunded,
}

impl PpobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PpobStatus::Pending => "pending",
            PpobStatus::Processing => "processing",
            PpobStatus::Success => "success",
            PpobStatus::Failed => "failed",
            PpobStatus::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PpobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PpobStatus::Pending),
            "processing" => Ok(PpobStatus::Processing),
            "success" => Ok(PpobStatus::Success),
            "failed" => Ok(PpobStatus::Failed),
            "refunded" => Ok(PpobStatus::Refunded),
            other => Err(format!("unknown ppob status: {other}")),
        }
    }
}

/// A purchase record from the `ppob_transactions` table.
///
/// `total_price` is debited exactly once per `reference_id`; `refunded_at`
/// records the single compensating credit, if one happened.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PpobTransaction {
    pub id: Uuid,
    pub reference_id: String,
    pub product_code: String,
    pub product_name: String,
    pub product_type: String,
    /// Destination number/account the product is delivered to.
    pub target: String,
    pub price: Money,
    pub admin_fee: Money,
    pub total_price: Money,
    pub status: String,
    pub tripay_reference: Option<String>,
    pub tripay_status: Option<String>,
    /// Serial number, set on success.
    pub sn: Option<String>,
    pub message: Option<String>,
    pub email: Option<String>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog entry from the `ppob_products` table, maintained by the
/// sync job and read-only to the purchase flow.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PpobProduct {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub product_type: String,
    pub price: Money,
    pub admin_fee: Money,
    pub stock: i32,
    pub status: String,
    pub provider: String,
    pub updated_at: DateTime<Utc>,
}

/// Request body for purchasing a product.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub user_id: Uuid,
    pub product_type: String,
    pub product_code: String,
    pub target: String,
    pub email: Option<String>,
}

/// Request body for a price inquiry ahead of a purchase.
#[derive(Debug, Deserialize)]
pub struct InquiryRequest {
    pub product_type: String,
    pub product_code: String,
    pub target: String,
}

/// Inquiry result: the resolved product with its price breakdown, plus
/// the echoed delivery target. No state is touched.
#[derive(Debug, Serialize)]
pub struct InquiryResponse {
    pub target: String,
    pub product: ProductView,
}

/// Provider callback payload (already signature-verified by the handler).
#[derive(Debug, Deserialize)]
pub struct CallbackPayload {
    pub merchant_ref: String,
    pub reference: String,
    pub status: String,
    pub note: Option<String>,
}

/// Product view returned by the products endpoint, normalized from the
/// aggregator's catalog shape.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub price: Money,
    pub admin_fee: Money,
    pub total_price: Money,
    pub status: String,
    pub stock: i64,
}

/// Response body for purchase/status/history endpoints.
#[derive(Debug, Serialize)]
pub struct PpobTransactionResponse {
    pub id: Uuid,
    pub reference_id: String,
    pub product_code: String,
    pub product_name: String,
    pub product_type: String,
    pub target: String,
    pub price: Money,
    pub admin_fee: Money,
    pub total_price: Money,
    pub status: String,
    pub sn: Option<String>,
    pub message: Option<String>,
    pub tripay_reference: Option<String>,
    pub tripay_status: Option<String>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PpobTransaction> for PpobTransactionResponse {
    fn from(t: PpobTransaction) -> Self {
        Self {
            id: t.id,
            reference_id: t.reference_id,
            product_code: t.product_code,
            product_name: t.product_name,
            product_type: t.product_type,
            target: t.target,
            price: t.price,
            admin_fee: t.admin_fee,
            total_price: t.total_price,
            status: t.status,
            sn: t.sn,
            message: t.message,
            tripay_reference: t.tripay_reference,
            tripay_status: t.tripay_status,
            user_id: t.user_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Per-user purchase statistics.
#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct PpobStats {
    pub total_transactions: i64,
    pub success_transactions: i64,
    pub today_transactions: i64,
    pub total_volume: Money,
}
