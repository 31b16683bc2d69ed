//! Product catalog routes. Create/update accept multipart forms whose image
//! files are pushed to object storage concurrently before the row is written.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, services::uploader::{ImageUploader, UploadFile}};

use super::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: i64,
    name: String,
    category: Option<String>,
    subcategory: Option<String>,
    price: Decimal,
    stock: i32,
    images: Vec<String>,
    is_new: bool,
    is_bestseller: bool,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductResponse {
    product: ProductRow,
}

#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
    is_new: bool,
    is_bestseller: bool,
    is_featured: bool,
    existing_images: Vec<String>,
    files: Vec<UploadFile>,
}

impl ProductForm {
    async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "images" {
                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                form.files.push(UploadFile { filename, bytes: bytes.to_vec() });
                continue;
            }
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            match name.as_str() {
                "name" => form.name = Some(value),
                "category" => form.category = Some(value),
                "subcategory" => form.subcategory = Some(value),
                "price" => {
                    form.price = Some(value.parse().map_err(|_| {
                        ApiError::Validation("price must be a decimal number".into())
                    })?);
                }
                "stock" => {
                    form.stock = Some(value.parse().map_err(|_| {
                        ApiError::Validation("stock must be an integer".into())
                    })?);
                }
                "is_new" => form.is_new = value == "true",
                "is_bestseller" => form.is_bestseller = value == "true",
                "is_featured" => form.is_featured = value == "true",
                "existingImages" => {
                    form.existing_images = serde_json::from_str(&value).map_err(|_| {
                        ApiError::Validation("existingImages must be a JSON array".into())
                    })?;
                }
                _ => {}
            }
        }
        Ok(form)
    }

    async fn upload_images(
        &mut self,
        uploader: Option<&ImageUploader>,
    ) -> Result<Vec<String>, ApiError> {
        let mut urls = std::mem::take(&mut self.existing_images);
        if self.files.is_empty() {
            return Ok(urls);
        }
        let uploader = uploader
            .ok_or_else(|| ApiError::Upstream("image uploader is not configured".into()))?;
        urls.extend(uploader.upload_all(std::mem::take(&mut self.files)).await?);
        Ok(urls)
    }
}

pub(super) async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let mut form = ProductForm::parse(multipart).await?;
    let Some(name) = form.name.clone() else {
        return Err(ApiError::Validation("name is required".into()));
    };
    let Some(price) = form.price else {
        return Err(ApiError::Validation("price is required".into()));
    };
    let images = form.upload_images(state.uploader.as_deref()).await?;

    let product: ProductRow = sqlx::query_as(
        "INSERT INTO products
           (name, category, subcategory, price, stock, images, is_new, is_bestseller, is_featured)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(&name)
    .bind(&form.category)
    .bind(&form.subcategory)
    .bind(price)
    .bind(form.stock.unwrap_or(0))
    .bind(&images)
    .bind(form.is_new)
    .bind(form.is_bestseller)
    .bind(form.is_featured)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, ApiError> {
    let mut form = ProductForm::parse(multipart).await?;
    let Some(name) = form.name.clone() else {
        return Err(ApiError::Validation("name is required".into()));
    };
    let Some(price) = form.price else {
        return Err(ApiError::Validation("price is required".into()));
    };
    let images = form.upload_images(state.uploader.as_deref()).await?;

    let product: Option<ProductRow> = sqlx::query_as(
        "UPDATE products
         SET name = $1, category = $2, subcategory = $3, price = $4, stock = $5,
             images = $6, is_new = $7, is_bestseller = $8, is_featured = $9
         WHERE id = $10
         RETURNING *",
    )
    .bind(&name)
    .bind(&form.category)
    .bind(&form.subcategory)
    .bind(price)
    .bind(form.stock.unwrap_or(0))
    .bind(&images)
    .bind(form.is_new)
    .bind(form.is_bestseller)
    .bind(form.is_featured)
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    let product = product.ok_or_else(|| ApiError::not_found("Product"))?;
    Ok(Json(ProductResponse { product }))
}

pub(super) async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductRow>>, ApiError> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY id DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(products))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductRow>, ApiError> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub(super) async fn list_new(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRow>>, ApiError> {
    let products =
        sqlx::query_as("SELECT * FROM products WHERE is_new = true ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(products))
}

pub(super) async fn list_bestsellers(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRow>>, ApiError> {
    let products = sqlx::query_as("SELECT * FROM products WHERE is_bestseller = true")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(products))
}

pub(super) async fn list_featured(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRow>>, ApiError> {
    let products = sqlx::query_as("SELECT * FROM products WHERE is_featured = true")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(products))
}

pub(super) async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<ProductRow>>, ApiError> {
    let products = sqlx::query_as("SELECT * FROM products WHERE name ILIKE $1")
        .bind(format!("%{query}%"))
        .fetch_all(&state.db)
        .await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
pub(super) struct SetStockRequest {
    stock: i32,
}

pub(super) async fn set_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SetStockRequest>,
) -> Result<Json<ProductRow>, ApiError> {
    if body.stock < 0 {
        return Err(ApiError::Validation("stock cannot be negative".into()));
    }
    sqlx::query_as("UPDATE products SET stock = $1 WHERE id = $2 RETURNING *")
        .bind(body.stock)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product"))
}

#[derive(Debug, Deserialize)]
pub(super) struct ReduceStockRequest {
    quantity: i32,
}

/// Flat stock decrement with the insufficient-stock guard folded into one
/// conditional update, so concurrent decrements can never drive stock negative.
pub(super) async fn reduce_stock(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ReduceStockRequest>,
) -> Result<Json<ProductRow>, ApiError> {
    if body.quantity < 1 {
        return Err(ApiError::Validation("quantity must be at least 1".into()));
    }
    let updated: Option<ProductRow> = sqlx::query_as(
        "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1 RETURNING *",
    )
    .bind(body.quantity)
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    match updated {
        Some(product) => Ok(Json(product)),
        None => {
            let exists: Option<(i32,)> = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&state.db)
                .await?;
            Err(match exists {
                Some(_) => ApiError::InsufficientStock,
                None => ApiError::not_found("Product"),
            })
        }
    }
}

pub(super) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Product"));
    }
    Ok(Json(serde_json::json!({ "message": "Product deleted successfully" })))
}
