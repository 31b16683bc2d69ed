//! Order routes: placement (with the cart-clearing side effect), admin reads,
//! status updates, the return workflow, and payment verification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;

use crate::{
    domain::{
        cart::CartLine,
        order::{self, OrderLine, ReturnAction},
    },
    error::ApiError,
    services::payments::GatewayOrder,
};

use super::{AppState, MessageResponse};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(super) struct OrderRow {
    order_id: i64,
    user_id: i64,
    items: SqlJson<Vec<OrderLine>>,
    total_amount: Decimal,
    order_status: String,
    payment_status: String,
    payment_method: String,
    shipping_address: serde_json::Value,
    return_reason: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderRequest {
    user_id: Option<i64>,
    items: Option<Vec<CartLine>>,
    total_amount: Decimal,
    shipping_address: serde_json::Value,
    payment_method: String,
    payment_status: Option<String>,
}

/// Place an order from a snapshotted cart. When the effective payment status is
/// paid, or the method is cash-on-delivery, the user's cart is deleted wholesale
/// in the same transaction. The whole cart goes, not just the ordered lines;
/// partial-cart checkout is not supported by this contract.
pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderRow>), ApiError> {
    let (Some(user_id), Some(items)) = (body.user_id, body.items) else {
        return Err(ApiError::Validation("user_id and items are required".into()));
    };
    if items.is_empty() {
        return Err(ApiError::Validation("Order must contain at least one item".into()));
    }

    let payment_status =
        order::effective_payment_status(&body.payment_method, body.payment_status.as_deref());
    let items: Vec<OrderLine> = items.into_iter().map(OrderLine::from).collect();

    let mut tx = state.db.begin().await?;
    let created: OrderRow = sqlx::query_as(
        "INSERT INTO orders
           (user_id, items, total_amount, order_status, payment_status, payment_method,
            shipping_address, created_at)
         VALUES ($1, $2, $3, 'Pending', $4, $5, $6, NOW())
         RETURNING *",
    )
    .bind(user_id)
    .bind(SqlJson(&items))
    .bind(body.total_amount)
    .bind(&payment_status)
    .bind(&body.payment_method)
    .bind(&body.shipping_address)
    .fetch_one(&mut *tx)
    .await?;

    if order::clears_cart(&body.payment_method, &payment_status) {
        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!(order_id = created.order_id, user_id, "order placed");
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<OrderRow>>, ApiError> {
    let orders = sqlx::query_as("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(orders))
}

pub(super) async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<OrderRow>>, ApiError> {
    let orders =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&state.db)
            .await?;
    Ok(Json(orders))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderRow>, ApiError> {
    sqlx::query_as("SELECT * FROM orders WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order"))
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateStatusRequest {
    order_status: String,
}

pub(super) async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<OrderRow>, ApiError> {
    sqlx::query_as("UPDATE orders SET order_status = $1 WHERE order_id = $2 RETURNING *")
        .bind(&body.order_status)
        .bind(order_id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Order"))
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateOrderRequest {
    items: Vec<OrderLine>,
    total_amount: Decimal,
    shipping_address: serde_json::Value,
    payment_method: String,
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<UpdateOrderRequest>,
) -> Result<Json<OrderRow>, ApiError> {
    sqlx::query_as(
        "UPDATE orders
         SET items = $1, total_amount = $2, shipping_address = $3, payment_method = $4
         WHERE order_id = $5
         RETURNING *",
    )
    .bind(SqlJson(&body.items))
    .bind(body.total_amount)
    .bind(&body.shipping_address)
    .bind(&body.payment_method)
    .bind(order_id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::not_found("Order"))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
        .bind(order_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Order"));
    }
    Ok(Json(serde_json::json!({ "message": "Order deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub(super) struct ReturnRequest {
    reason: Option<String>,
}

/// Flag every item of the order as return-requested, recording one shared
/// reason for the whole order.
pub(super) async fn request_return(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<ReturnRequest>,
) -> Result<Json<OrderRow>, ApiError> {
    let mut tx = state.db.begin().await?;
    let mut items = fetch_items_locked(&mut tx, order_id).await?;
    order::request_return(&mut items);
    let updated: OrderRow = sqlx::query_as(
        "UPDATE orders SET items = $1, return_reason = $2 WHERE order_id = $3 RETURNING *",
    )
    .bind(SqlJson(&items))
    .bind(&body.reason)
    .bind(order_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub(super) struct ResolveReturnRequest {
    action: String,
}

pub(super) async fn resolve_return(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<ResolveReturnRequest>,
) -> Result<Json<OrderRow>, ApiError> {
    // Reject bad actions before touching the row.
    let action: ReturnAction = body.action.parse()?;

    let mut tx = state.db.begin().await?;
    let mut items = fetch_items_locked(&mut tx, order_id).await?;
    order::resolve_return(&mut items, action);
    let updated: OrderRow =
        sqlx::query_as("UPDATE orders SET items = $1 WHERE order_id = $2 RETURNING *")
            .bind(SqlJson(&items))
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;
    tx.commit().await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub(super) struct CheckoutRequest {
    amount: Decimal,
    currency: Option<String>,
    receipt: Option<String>,
}

/// Register the pending order with the payment gateway and hand its order id
/// back to the client for the payment widget.
pub(super) async fn checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<GatewayOrder>, ApiError> {
    let gateway = state
        .payments
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("payment gateway is not configured".into()))?;
    let receipt = body
        .receipt
        .unwrap_or_else(|| format!("rcpt-{:08}", rand::random::<u32>()));
    let currency = body.currency.as_deref().unwrap_or("INR");
    let gateway_order = gateway.create_order(body.amount, currency, &receipt).await?;
    Ok(Json(gateway_order))
}

#[derive(Debug, Deserialize)]
pub(super) struct VerifyPaymentRequest {
    order_id: i64,
    gateway_order_id: String,
    payment_id: String,
    signature: String,
}

/// Check the gateway signature over `gateway_order_id|payment_id` and, when it
/// matches, mark the order as paid. A mismatch is the client's problem, not a
/// server fault: it maps to a 400.
pub(super) async fn verify_payment(
    State(state): State<AppState>,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<Json<MessageResponse<OrderRow>>, ApiError> {
    let gateway = state
        .payments
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("payment gateway is not configured".into()))?;
    if !gateway.verify_signature(&body.gateway_order_id, &body.payment_id, &body.signature) {
        return Err(ApiError::InvalidArgument("Invalid payment signature".into()));
    }

    let updated: Option<OrderRow> =
        sqlx::query_as("UPDATE orders SET payment_status = 'paid' WHERE order_id = $1 RETURNING *")
            .bind(body.order_id)
            .fetch_optional(&state.db)
            .await?;
    let order = updated.ok_or_else(|| ApiError::not_found("Order"))?;
    Ok(Json(MessageResponse { message: "Payment verified", data: order }))
}

async fn fetch_items_locked(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: i64,
) -> Result<Vec<OrderLine>, ApiError> {
    let row: Option<(SqlJson<Vec<OrderLine>>,)> =
        sqlx::query_as("SELECT items FROM orders WHERE order_id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await?;
    row.map(|(items,)| items.0).ok_or_else(|| ApiError::not_found("Order"))
}
