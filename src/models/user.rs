//! Wallet owner (user) model and API types.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user record from the `users` table.
///
/// The `saldo` column is the authoritative money store (the ledger).
/// It is guarded by a `saldo >= 0` CHECK constraint in the database and
/// only ever mutated through row-locked read-modify-write cycles.
///
/// Users are never hard-deleted; `deleted_at` marks soft deletion so the
/// transaction audit trail stays intact.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub nama: String,
    pub email: String,
    pub no_hp: Option<String>,
    pub saldo: Money,
    /// One of `active`, `blocked`, `inactive`.
    pub status_akun: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// The public subset of user fields joined into transaction responses.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct UserPublic {
    pub id: Uuid,
    pub nama: String,
    pub email: String,
    pub no_hp: Option<String>,
}

/// Request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub nama: String,
    pub email: String,
    pub no_hp: Option<String>,
}

/// Query parameters for listing users.
#[derive(Debug, Default, Deserialize)]
pub struct FilterUsers {
    /// Case-insensitive match against name or email.
    pub search: Option<String>,
    pub status_akun: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Response body for user endpoints. Hides soft-delete bookkeeping.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub nama: String,
    pub email: String,
    pub no_hp: Option<String>,
    pub saldo: Money,
    pub status_akun: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nama: user.nama,
            email: user.email,
            no_hp: user.no_hp,
            saldo: user.saldo,
            status_akun: user.status_akun,
            created_at: user.created_at,
        }
    }
}
