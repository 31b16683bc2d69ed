//! Cash-on-delivery settings: a tiny admin table holding the COD surcharge.

use axum::{extract::{Path, State}, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, MessageResponse};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(super) struct CodSettingRow {
    id: i64,
    cod_charge: Decimal,
}

#[derive(Debug, Deserialize)]
pub(super) struct CodSettingRequest {
    cod_charge: Option<Decimal>,
}

pub(super) async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<CodSettingRow>>, ApiError> {
    let settings = sqlx::query_as("SELECT * FROM cod_settings ORDER BY id ASC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(settings))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CodSettingRow>, ApiError> {
    sqlx::query_as("SELECT * FROM cod_settings WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Setting"))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<CodSettingRequest>,
) -> Result<(StatusCode, Json<MessageResponse<CodSettingRow>>), ApiError> {
    let Some(cod_charge) = body.cod_charge else {
        return Err(ApiError::Validation("cod_charge required".into()));
    };
    let setting: CodSettingRow =
        sqlx::query_as("INSERT INTO cod_settings (cod_charge) VALUES ($1) RETURNING *")
            .bind(cod_charge)
            .fetch_one(&state.db)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { message: "Setting created", data: setting }),
    ))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CodSettingRequest>,
) -> Result<Json<MessageResponse<CodSettingRow>>, ApiError> {
    let Some(cod_charge) = body.cod_charge else {
        return Err(ApiError::Validation("cod_charge required".into()));
    };
    let setting: Option<CodSettingRow> =
        sqlx::query_as("UPDATE cod_settings SET cod_charge = $1 WHERE id = $2 RETURNING *")
            .bind(cod_charge)
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let setting = setting.ok_or_else(|| ApiError::not_found("Setting"))?;
    Ok(Json(MessageResponse { message: "Setting updated", data: setting }))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse<CodSettingRow>>, ApiError> {
    let setting: Option<CodSettingRow> =
        sqlx::query_as("DELETE FROM cod_settings WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&state.db)
            .await?;
    let setting = setting.ok_or_else(|| ApiError::not_found("Setting"))?;
    Ok(Json(MessageResponse { message: "Setting deleted", data: setting }))
}
