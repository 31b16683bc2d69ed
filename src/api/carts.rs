//! Cart routes. Every mutation locks the cart row for the duration of the
//! transaction so concurrent requests against the same cart serialize instead
//! of overwriting each other's items.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use sqlx::types::Json as SqlJson;

use crate::{
    domain::cart::{Cart, CartLine},
    error::ApiError,
};

use super::AppState;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    user_id: i64,
    items: SqlJson<Vec<CartLine>>,
}

impl CartRow {
    fn into_cart(self) -> Cart {
        Cart { user_id: self.user_id, items: self.items.0 }
    }
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Cart>, ApiError> {
    let row: Option<CartRow> =
        sqlx::query_as("SELECT user_id, items FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&state.db)
            .await?;
    // A user with no cart row still gets an empty cart shape.
    Ok(Json(row.map_or_else(|| Cart::empty(user_id), CartRow::into_cart)))
}

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<Cart>>, ApiError> {
    let rows: Vec<CartRow> = sqlx::query_as("SELECT user_id, items FROM carts ORDER BY user_id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(CartRow::into_cart).collect()))
}

#[derive(Debug, Deserialize)]
pub(super) struct AddItemRequest {
    user_id: Option<i64>,
    product: Option<CartLine>,
}

pub(super) async fn add_item(
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<Cart>, ApiError> {
    let (Some(user_id), Some(line)) = (body.user_id, body.product) else {
        return Err(ApiError::Validation("Invalid product or user ID".into()));
    };

    let mut tx = state.db.begin().await?;
    // A missing row would make the FOR UPDATE below lock nothing, letting two
    // first adds for the same user each start from an empty cart. Create the
    // row first so the locked read always has something to serialize on.
    sqlx::query(
        "INSERT INTO carts (user_id, items) VALUES ($1, '[]') ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
    let mut cart = fetch_cart_locked(&mut tx, user_id).await?;
    cart.add_line(line)?;
    let updated = persist_items(&mut tx, &cart).await?;
    tx.commit().await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateItemRequest {
    product_id: i64,
    #[serde(default)]
    selected_size: String,
    #[serde(default)]
    selected_color: String,
    quantity: u32,
}

pub(super) async fn update_item(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<Cart>, ApiError> {
    let mut tx = state.db.begin().await?;
    let mut cart = fetch_cart_locked(&mut tx, user_id).await?;
    cart.update_quantity(
        body.product_id,
        &body.selected_size,
        &body.selected_color,
        body.quantity,
    )?;
    let updated = persist_items(&mut tx, &cart).await?;
    tx.commit().await?;
    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub(super) struct RemoveItemRequest {
    product_id: i64,
    #[serde(default)]
    selected_size: String,
    #[serde(default)]
    selected_color: String,
}

pub(super) async fn remove_item(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(body): Json<RemoveItemRequest>,
) -> Result<Json<Cart>, ApiError> {
    let mut tx = state.db.begin().await?;
    let mut cart = fetch_cart_locked(&mut tx, user_id).await?;
    cart.remove_line(body.product_id, &body.selected_size, &body.selected_color)?;
    let updated = persist_items(&mut tx, &cart).await?;
    tx.commit().await?;
    Ok(Json(updated))
}

pub(super) async fn remove_product(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<Cart>, ApiError> {
    let mut tx = state.db.begin().await?;
    let mut cart = fetch_cart_locked(&mut tx, user_id).await?;
    cart.remove_product(product_id);
    let updated = persist_items(&mut tx, &cart).await?;
    tx.commit().await?;
    Ok(Json(updated))
}

async fn fetch_cart_locked(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: i64,
) -> Result<Cart, ApiError> {
    let row: Option<CartRow> =
        sqlx::query_as("SELECT user_id, items FROM carts WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;
    row.map(CartRow::into_cart).ok_or_else(|| ApiError::not_found("Cart"))
}

async fn persist_items(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    cart: &Cart,
) -> Result<Cart, ApiError> {
    let updated: CartRow =
        sqlx::query_as("UPDATE carts SET items = $1 WHERE user_id = $2 RETURNING user_id, items")
            .bind(SqlJson(&cart.items))
            .bind(cart.user_id)
            .fetch_one(&mut **tx)
            .await?;
    Ok(updated.into_cart())
}
