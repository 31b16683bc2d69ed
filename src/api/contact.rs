//! Contact-form routes: public submission plus an admin inbox.

use axum::{extract::{Path, State}, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

use super::{AppState, MessageResponse};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(super) struct ContactMessageRow {
    id: i64,
    full_name: String,
    email: String,
    message: String,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct SubmitRequest {
    #[validate(length(min = 1))]
    full_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    message: String,
}

pub(super) async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<MessageResponse<ContactMessageRow>>), ApiError> {
    body.validate()?;
    let saved: ContactMessageRow = sqlx::query_as(
        "INSERT INTO contact_messages (full_name, email, message) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&body.full_name)
    .bind(&body.email)
    .bind(&body.message)
    .fetch_one(&state.db)
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { message: "Message saved", data: saved }),
    ))
}

pub(super) async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessageRow>>, ApiError> {
    let messages = sqlx::query_as("SELECT * FROM contact_messages ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(messages))
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateStatusRequest {
    status: String,
}

pub(super) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<MessageResponse<ContactMessageRow>>, ApiError> {
    let updated: Option<ContactMessageRow> =
        sqlx::query_as("UPDATE contact_messages SET status = $1 WHERE id = $2 RETURNING *")
            .bind(&body.status)
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let message = updated.ok_or_else(|| ApiError::not_found("Message"))?;
    Ok(Json(MessageResponse { message: "Status updated", data: message }))
}
