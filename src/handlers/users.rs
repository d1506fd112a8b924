//! User account HTTP handlers.
//!
//! - `POST /api/v1/users` - register a user
//! - `GET /api/v1/users` - list users
//! - `GET /api/v1/users/{id}` - get one user
//! - `DELETE /api/v1/users/{id}` - soft-delete a user

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, FilterUsers, User, UserResponse},
    models::{page_window, PageMeta, Paginated},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::QueryBuilder;
use uuid::Uuid;

/// Register a new user. Balance starts at zero and is only ever changed
/// through ledger operations.
///
/// Duplicate emails map to 409 via the unique constraint.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let nama = request.nama.trim();
    if nama.is_empty() {
        return Err(AppError::InvalidRequest("Name is required".to_string()));
    }
    let email = request.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 5 {
        return Err(AppError::InvalidRequest(
            "A valid email address is required".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (nama, email, no_hp, saldo, status_akun, role)
        VALUES ($1, $2, $3, 0, 'active', 'user')
        RETURNING *
        "#,
    )
    .bind(nama)
    .bind(&email)
    .bind(&request.no_hp)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Get a user by id. Soft-deleted users are invisible here.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// List users with optional search and status filtering.
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<FilterUsers>,
) -> Result<Json<Paginated<UserResponse>>, AppError> {
    let (page, limit, offset) = page_window(filter.page, filter.limit);

    let mut query = QueryBuilder::new("SELECT * FROM users WHERE deleted_at IS NULL");
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL");
    for builder in [&mut query, &mut count] {
        if let Some(ref search) = filter.search {
            let pattern = format!("%{search}%");
            builder
                .push(" AND (nama ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(ref status) = filter.status_akun {
            builder.push(" AND status_akun = ").push_bind(status.clone());
        }
    }
    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<User> = query.build_query_as().fetch_all(&state.pool).await?;
    let total: i64 = count.build_query_scalar().fetch_one(&state.pool).await?;

    Ok(Json(Paginated {
        data: rows.into_iter().map(Into::into).collect(),
        meta: PageMeta::new(total, page, limit),
    }))
}

/// Soft-delete a user. The row and its transaction history survive for
/// the audit trail; the account just stops resolving.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let affected = sqlx::query(
        "UPDATE users SET deleted_at = NOW(), status_akun = 'inactive', updated_at = NOW()
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(&state.pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(AppError::UserNotFound);
    }

    tracing::info!(user_id = %id, "user soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
