//! Coupon admin routes.

use axum::{extract::{Path, State}, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;

use super::{AppState, MessageResponse};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(super) struct CouponRow {
    id: i64,
    code: String,
    discount_type: String,
    discount_value: Decimal,
    applicable_products: Vec<i64>,
    applicable_categories: Vec<String>,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct CouponRequest {
    #[validate(length(min = 1))]
    code: String,
    #[validate(length(min = 1))]
    discount_type: String,
    discount_value: Decimal,
    #[serde(default)]
    applicable_products: Vec<i64>,
    #[serde(default)]
    applicable_categories: Vec<String>,
    expiry_date: Option<NaiveDate>,
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<CouponRequest>,
) -> Result<(StatusCode, Json<MessageResponse<CouponRow>>), ApiError> {
    body.validate()?;
    let coupon: CouponRow = sqlx::query_as(
        "INSERT INTO coupons
           (code, discount_type, discount_value, applicable_products, applicable_categories, expiry_date)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(&body.code)
    .bind(&body.discount_type)
    .bind(body.discount_value)
    .bind(&body.applicable_products)
    .bind(&body.applicable_categories)
    .bind(body.expiry_date)
    .fetch_one(&state.db)
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse { message: "Coupon added", data: coupon }),
    ))
}

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<CouponRow>>, ApiError> {
    let coupons = sqlx::query_as("SELECT * FROM coupons ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(coupons))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CouponRequest>,
) -> Result<Json<MessageResponse<CouponRow>>, ApiError> {
    body.validate()?;
    let coupon: Option<CouponRow> = sqlx::query_as(
        "UPDATE coupons
         SET code = $1, discount_type = $2, discount_value = $3,
             applicable_products = $4, applicable_categories = $5, expiry_date = $6
         WHERE id = $7
         RETURNING *",
    )
    .bind(&body.code)
    .bind(&body.discount_type)
    .bind(body.discount_value)
    .bind(&body.applicable_products)
    .bind(&body.applicable_categories)
    .bind(body.expiry_date)
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    let coupon = coupon.ok_or_else(|| ApiError::not_found("Coupon"))?;
    Ok(Json(MessageResponse { message: "Coupon updated", data: coupon }))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Coupon"));
    }
    Ok(Json(serde_json::json!({ "message": "Coupon deleted" })))
}
