//! User registration and login. Password hashes never leave the handler; the
//! row type returned to clients simply has no hash column selected.

use axum::{extract::{Path, State}, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

use super::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(super) struct UserRow {
    user_id: i64,
    full_name: String,
    email: String,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct UserResponse {
    user: UserRow,
}

#[derive(Debug, Serialize)]
pub(super) struct UsersResponse {
    users: Vec<UserRow>,
}

const PUBLIC_COLUMNS: &str = "user_id, full_name, email, phone_number, created_at";

#[derive(Debug, Deserialize, Validate)]
pub(super) struct RegisterRequest {
    #[validate(length(min = 1))]
    full_name: String,
    #[validate(email)]
    email: String,
    phone_number: Option<String>,
    #[validate(length(min = 6))]
    password: String,
}

pub(super) async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    body.validate()?;

    // Fast path; the UNIQUE constraint below is what actually guarantees it.
    let existing: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Validation("Email already registered".into()));
    }

    // bcrypt is deliberately slow; keep it off the async worker threads.
    let password = body.password;
    let password_hash =
        tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST)).await??;

    let user: UserRow = sqlx::query_as(&format!(
        "INSERT INTO users (full_name, email, phone_number, password_hash)
         VALUES ($1, $2, $3, $4)
         RETURNING {PUBLIC_COLUMNS}"
    ))
    .bind(&body.full_name)
    .bind(&body.email)
    .bind(&body.phone_number)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(map_registration_error)?;

    Ok(Json(UserResponse { user }))
}

/// A concurrent registration can slip past the fast-path email check and trip
/// the UNIQUE constraint instead; that is still a duplicate email, not a
/// server fault.
fn map_registration_error(e: sqlx::Error) -> ApiError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::Validation("Email already registered".into())
        }
        _ => e.into(),
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    user_id: i64,
    full_name: String,
    email: String,
    phone_number: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

pub(super) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    // Unknown email and wrong password produce the same response.
    let invalid = || ApiError::Validation("Invalid credentials".into());

    let row: Option<CredentialRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&body.email)
        .fetch_optional(&state.db)
        .await?;
    let row = row.ok_or_else(invalid)?;

    let password = body.password;
    let hash = row.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    if !valid {
        return Err(invalid());
    }

    Ok(Json(UserResponse {
        user: UserRow {
            user_id: row.user_id,
            full_name: row.full_name,
            email: row.email,
            phone_number: row.phone_number,
            created_at: row.created_at,
        },
    }))
}

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = sqlx::query_as(&format!("SELECT {PUBLIC_COLUMNS} FROM users ORDER BY user_id"))
        .fetch_all(&state.db)
        .await?;
    Ok(Json(UsersResponse { users }))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {PUBLIC_COLUMNS} FROM users WHERE user_id = $1"))
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let user = user.ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(UserResponse { user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::fmt;

    #[derive(Debug)]
    struct StubDbError(ErrorKind);

    impl fmt::Display for StubDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "duplicate key value violates unique constraint \"users_email_key\"")
        }
    }

    impl std::error::Error for StubDbError {}

    impl DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"users_email_key\""
        }

        fn kind(&self) -> ErrorKind {
            match self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                _ => ErrorKind::Other,
            }
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn unique_violation_on_insert_is_a_duplicate_email() {
        let err = sqlx::Error::Database(Box::new(StubDbError(ErrorKind::UniqueViolation)));
        let mapped = map_registration_error(err);
        assert!(
            matches!(&mapped, ApiError::Validation(msg) if msg == "Email already registered")
        );
    }

    #[test]
    fn other_database_errors_pass_through() {
        let err = sqlx::Error::Database(Box::new(StubDbError(ErrorKind::Other)));
        assert!(matches!(map_registration_error(err), ApiError::Database(_)));
    }
}
