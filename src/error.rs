//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.
//! Storage-layer errors never leak raw text to clients: known Postgres
//! error codes are translated into the domain taxonomy here.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Domain-rule violations (insufficient funds, not found, forbidden,
/// validation) are detected before any mutating call; multi-step
/// operations roll back atomically, so none of these variants can leave
/// partial state behind.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Admin API key is missing, invalid, or inactive.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Provider callback signature did not verify.
    #[error("Invalid callback signature")]
    InvalidSignature,

    /// User does not exist or has been soft-deleted.
    #[error("User not found")]
    UserNotFound,

    /// Savings goal does not exist or has been soft-deleted.
    #[error("Tabungan not found")]
    TabunganNotFound,

    /// Savings goal is completed or cancelled and accepts no movements.
    #[error("Tabungan is not active")]
    TabunganNotActive,

    /// Transaction record does not exist.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// PPOB product code does not resolve in the catalog.
    #[error("Product not found")]
    ProductNotFound,

    /// PPOB product exists but is currently unavailable.
    #[error("Product is unavailable")]
    ProductUnavailable,

    /// Balance does not cover the requested debit.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Admin adjustment would make the balance negative.
    #[error("Balance cannot be negative")]
    BalanceCannotBeNegative,

    /// Acting user does not own the targeted resource.
    #[error("Forbidden")]
    Forbidden,

    /// Account is blocked and cannot move funds.
    #[error("Account is blocked")]
    AccountBlocked,

    /// Duplicate unique field (email, reference id).
    #[error("{0}")]
    Conflict(String),

    /// The external payment aggregator failed or timed out.
    #[error("Payment provider error: {0}")]
    Provider(String),

    /// Request body or parameters are invalid.
    #[error("{0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Translate low-level Postgres errors into domain errors.
    ///
    /// - 23505 (unique violation)      -> Conflict
    /// - 23503 (foreign-key violation) -> the referenced row is missing
    ///
    /// Anything else stays `Database` and surfaces as a generic 500.
    pub fn translate_db(self) -> AppError {
        let AppError::Database(sqlx::Error::Database(ref db)) = self else {
            return self;
        };
        match db.code().as_deref() {
            Some("23505") => {
                let constraint = db.constraint().unwrap_or_default();
                if constraint.contains("email") {
                    AppError::Conflict("Email is already registered".to_string())
                } else {
                    AppError::Conflict("Duplicate value for a unique field".to_string())
                }
            }
            Some("23503") => {
                let constraint = db.constraint().unwrap_or_default();
                if constraint.contains("tabungan") {
                    AppError::TabunganNotFound
                } else if constraint.contains("user") {
                    AppError::UserNotFound
                } else {
                    AppError::InvalidRequest("Referenced record not found".to_string())
                }
            }
            _ => self,
        }
    }

    /// True if this is a unique violation on the given constraint fragment.
    /// Used by the PPOB engine to retry a reference-id collision once.
    pub fn is_unique_violation_on(&self, fragment: &str) -> bool {
        if let AppError::Database(sqlx::Error::Database(db)) = self {
            db.code().as_deref() == Some("23505")
                && db.constraint().unwrap_or_default().contains(fragment)
        } else {
            false
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// All errors return JSON in the form:
/// `{"error": {"code": "...", "message": "..."}}`
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let err = self.translate_db();
        let (status, code, message) = match err {
            AppError::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_api_key",
                err.to_string(),
            ),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "invalid_signature",
                err.to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", err.to_string()),
            AppError::TabunganNotFound => {
                (StatusCode::NOT_FOUND, "tabungan_not_found", err.to_string())
            }
            AppError::TabunganNotActive => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "tabungan_not_active",
                err.to_string(),
            ),
            AppError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                err.to_string(),
            ),
            AppError::ProductNotFound => {
                (StatusCode::NOT_FOUND, "product_not_found", err.to_string())
            }
            AppError::ProductUnavailable => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "product_unavailable",
                err.to_string(),
            ),
            AppError::InsufficientBalance => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                err.to_string(),
            ),
            AppError::BalanceCannotBeNegative => (
                StatusCode::BAD_REQUEST,
                "balance_cannot_be_negative",
                err.to_string(),
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", err.to_string()),
            AppError::AccountBlocked => {
                (StatusCode::FORBIDDEN, "account_blocked", err.to_string())
            }
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::Provider(ref msg) => (StatusCode::BAD_GATEWAY, "provider_error", msg.clone()),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_expected_status_codes() {
        assert_eq!(
            AppError::InsufficientBalance.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::UserNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("dup".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Provider("timeout".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn invalid_request_display_carries_the_detail() {
        let err = AppError::InvalidRequest("Minimum transaction amount is 1000".to_string());
        assert_eq!(err.to_string(), "Minimum transaction amount is 1000");
    }

    #[test]
    fn database_errors_hide_details() {
        let resp = AppError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
