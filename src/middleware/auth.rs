//! Admin API key authentication.
//!
//! Privileged routes sit behind this middleware. It extracts the bearer
//! token from the Authorization header, hashes it with SHA-256, and looks
//! the hash up in `admin_api_keys`. Plaintext keys are never stored.

use crate::error::AppError;
use crate::models::admin::AdminApiKey;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Identity of the admin behind an authenticated request, available to
/// handlers through `Extension<AdminContext>`.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub admin_key_id: Uuid,
    pub admin_name: String,
}

/// Authenticate `Authorization: Bearer <key>` against the hashed admin
/// key table. Rejects with 401 on a missing, malformed, or unknown key.
pub async fn admin_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidApiKey)?;

    let api_key = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidApiKey)?;

    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    let key_hash = hex::encode(hasher.finalize());

    let record = sqlx::query_as::<_, AdminApiKey>(
        "SELECT id, key_hash, admin_name, is_active, created_at
         FROM admin_api_keys
         WHERE key_hash = $1 AND is_active = true",
    )
    .bind(&key_hash)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::InvalidApiKey)?;

    request.extensions_mut().insert(AdminContext {
        admin_key_id: record.id,
        admin_name: record.admin_name,
    });

    Ok(next.run(request).await)
}
