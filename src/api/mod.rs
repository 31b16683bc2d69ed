//! HTTP surface: route groups mirroring the storefront's API.

mod bestsellers;
mod carts;
mod cod;
mod contact;
mod coupons;
mod orders;
mod products;
mod users;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{payments::PaymentGateway, uploader::ImageUploader};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub uploader: Option<Arc<ImageUploader>>,
    pub payments: Option<Arc<PaymentGateway>>,
}

/// `{message, data}` success envelope used by the admin-facing routes.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T: Serialize> {
    pub message: &'static str,
    pub data: T,
}

// Multipart uploads carry up to six images at 5 MB each.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products/add", post(products::create))
        .route("/products/update/:id", put(products::update))
        .route("/products/all", get(products::list))
        .route("/products/new", get(products::list_new))
        .route("/products/bestsellers", get(products::list_bestsellers))
        .route("/products/featured", get(products::list_featured))
        .route("/products/search/:query", get(products::search))
        .route("/products/stock/:id", patch(products::set_stock))
        .route("/products/reduce-stock/:id", patch(products::reduce_stock))
        .route("/products/delete/:id", delete(products::remove))
        .route("/products/:id", get(products::get))
        .route("/bestsellers/add", post(bestsellers::create))
        .route("/bestsellers/update/:id", put(bestsellers::update))
        .route("/bestsellers/all", get(bestsellers::list))
        .route("/bestsellers/reduce-stock", post(bestsellers::reduce_stock))
        .route("/bestsellers/delete/:id", delete(bestsellers::remove))
        .route("/bestsellers/:id/review", post(bestsellers::add_review))
        .route("/bestsellers/:id", get(bestsellers::get))
        .route("/carts", get(carts::list))
        .route("/carts/add", post(carts::add_item))
        .route("/carts/update/:user_id", patch(carts::update_item))
        .route("/carts/remove/:user_id", delete(carts::remove_item))
        .route("/carts/remove/:user_id/:product_id", delete(carts::remove_product))
        .route("/carts/:user_id", get(carts::get))
        .route("/orders/add", post(orders::create))
        .route("/orders", get(orders::list))
        .route("/orders/user/:user_id", get(orders::list_for_user))
        .route("/orders/checkout", post(orders::checkout))
        .route("/orders/verify-payment", post(orders::verify_payment))
        .route("/orders/:order_id/status", put(orders::update_status))
        .route(
            "/orders/:order_id/return",
            post(orders::request_return).put(orders::resolve_return),
        )
        .route(
            "/orders/:order_id",
            get(orders::get).put(orders::update).delete(orders::remove),
        )
        .route("/coupons/add", post(coupons::create))
        .route("/coupons", get(coupons::list))
        .route("/coupons/:id", put(coupons::update).delete(coupons::remove))
        .route("/cod-settings", get(cod::list).post(cod::create))
        .route(
            "/cod-settings/:id",
            get(cod::get).put(cod::update).delete(cod::remove),
        )
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users", get(users::list))
        .route("/users/:id", get(users::get))
        .route("/contact", post(contact::submit))
        .route("/contact/messages", get(contact::list))
        .route("/contact/messages/:id/status", put(contact::update_status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "elan-commerce" }))
}
