//! Bestseller routes: variant-level catalog entries with their own stock
//! guard, image set, and customer reviews.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use validator::Validate;

use crate::{
    domain::stock::{self, VariantStock},
    error::ApiError,
    services::uploader::{ImageUploader, UploadFile},
};

use super::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub(super) struct BestsellerRow {
    id: i64,
    name: String,
    category: Option<String>,
    description: Option<String>,
    main_image: Option<String>,
    thumbnails: SqlJson<Vec<String>>,
    variants: SqlJson<Vec<VariantStock>>,
    reviews: SqlJson<Vec<Review>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct BestsellerResponse {
    bestseller: BestsellerRow,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(super) struct Review {
    name: String,
    rating: i32,
    comment: String,
    date: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct BestsellerForm {
    name: Option<String>,
    category: Option<String>,
    description: Option<String>,
    variants: Vec<VariantStock>,
    main_image_file: Option<UploadFile>,
    thumbnail_files: Vec<UploadFile>,
    existing_main_image: Option<String>,
    existing_thumbnails: Vec<String>,
}

impl BestsellerForm {
    async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "mainImage" | "thumbnails" => {
                    let filename = field.file_name().unwrap_or("image").to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    let file = UploadFile { filename, bytes: bytes.to_vec() };
                    if name == "mainImage" {
                        form.main_image_file = Some(file);
                    } else {
                        form.thumbnail_files.push(file);
                    }
                }
                _ => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?;
                    match name.as_str() {
                        "name" => form.name = Some(value),
                        "category" => form.category = Some(value),
                        "description" => form.description = Some(value),
                        "variants" => {
                            form.variants = serde_json::from_str(&value).map_err(|_| {
                                ApiError::Validation("variants must be a JSON array".into())
                            })?;
                        }
                        "existingMainImage" => form.existing_main_image = Some(value),
                        "existingThumbnails" => {
                            form.existing_thumbnails =
                                serde_json::from_str(&value).map_err(|_| {
                                    ApiError::Validation(
                                        "existingThumbnails must be a JSON array".into(),
                                    )
                                })?;
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(form)
    }

    /// Resolve the final image set, uploading any new files. The main image
    /// and thumbnails go out concurrently in one batch.
    async fn upload_images(
        &mut self,
        uploader: Option<&ImageUploader>,
    ) -> Result<(Option<String>, Vec<String>), ApiError> {
        let mut main_image = self.existing_main_image.take();
        let mut thumbnails = std::mem::take(&mut self.existing_thumbnails);

        let has_main = self.main_image_file.is_some();
        let mut files: Vec<UploadFile> = self.main_image_file.take().into_iter().collect();
        files.append(&mut self.thumbnail_files);
        if files.is_empty() {
            return Ok((main_image, thumbnails));
        }

        let uploader = uploader
            .ok_or_else(|| ApiError::Upstream("image uploader is not configured".into()))?;
        let mut urls = uploader.upload_all(files).await?.into_iter();
        if has_main {
            main_image = urls.next();
        }
        thumbnails.extend(urls);
        Ok((main_image, thumbnails))
    }
}

pub(super) async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BestsellerResponse>), ApiError> {
    let mut form = BestsellerForm::parse(multipart).await?;
    let Some(name) = form.name.clone() else {
        return Err(ApiError::Validation("name is required".into()));
    };
    let (main_image, thumbnails) = form.upload_images(state.uploader.as_deref()).await?;

    let bestseller: BestsellerRow = sqlx::query_as(
        "INSERT INTO bestsellers (name, category, description, main_image, thumbnails, variants)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(&name)
    .bind(&form.category)
    .bind(&form.description)
    .bind(&main_image)
    .bind(SqlJson(&thumbnails))
    .bind(SqlJson(&form.variants))
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(BestsellerResponse { bestseller })))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<BestsellerResponse>, ApiError> {
    let mut form = BestsellerForm::parse(multipart).await?;
    let Some(name) = form.name.clone() else {
        return Err(ApiError::Validation("name is required".into()));
    };
    let (main_image, thumbnails) = form.upload_images(state.uploader.as_deref()).await?;

    let bestseller: Option<BestsellerRow> = sqlx::query_as(
        "UPDATE bestsellers
         SET name = $1, category = $2, description = $3, main_image = $4,
             thumbnails = $5, variants = $6, updated_at = NOW()
         WHERE id = $7
         RETURNING *",
    )
    .bind(&name)
    .bind(&form.category)
    .bind(&form.description)
    .bind(&main_image)
    .bind(SqlJson(&thumbnails))
    .bind(SqlJson(&form.variants))
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    let bestseller = bestseller.ok_or_else(|| ApiError::not_found("Best seller"))?;
    Ok(Json(BestsellerResponse { bestseller }))
}

pub(super) async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<BestsellerRow>>, ApiError> {
    let rows = sqlx::query_as("SELECT * FROM bestsellers ORDER BY id DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(rows))
}

pub(super) async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BestsellerRow>, ApiError> {
    sqlx::query_as("SELECT * FROM bestsellers WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Best seller"))
}

pub(super) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = sqlx::query("DELETE FROM bestsellers WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Best seller"));
    }
    Ok(Json(serde_json::json!({ "message": "Best seller deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub(super) struct ReduceStockRequest {
    bestseller_id: i64,
    size: String,
    color: String,
    quantity: u32,
}

#[derive(Debug, Serialize)]
pub(super) struct ReduceStockResponse {
    success: bool,
    variant: VariantStock,
}

/// Decrement one variant's stock. The variant list is read under a row lock and
/// written back in the same transaction, so two overlapping decrements cannot
/// both pass the guard on the same stale read.
pub(super) async fn reduce_stock(
    State(state): State<AppState>,
    Json(body): Json<ReduceStockRequest>,
) -> Result<Json<ReduceStockResponse>, ApiError> {
    if body.quantity < 1 {
        return Err(ApiError::Validation("quantity must be at least 1".into()));
    }

    let mut tx = state.db.begin().await?;
    let row: Option<(SqlJson<Vec<VariantStock>>,)> =
        sqlx::query_as("SELECT variants FROM bestsellers WHERE id = $1 FOR UPDATE")
            .bind(body.bestseller_id)
            .fetch_optional(&mut *tx)
            .await?;
    let mut variants = row
        .map(|(variants,)| variants.0)
        .ok_or_else(|| ApiError::not_found("Best seller"))?;

    let variant = stock::reduce_stock(&mut variants, &body.size, &body.color, body.quantity)?;

    sqlx::query("UPDATE bestsellers SET variants = $1, updated_at = NOW() WHERE id = $2")
        .bind(SqlJson(&variants))
        .bind(body.bestseller_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Json(ReduceStockResponse { success: true, variant }))
}

#[derive(Debug, Deserialize, Validate)]
pub(super) struct AddReviewRequest {
    #[validate(length(min = 1))]
    name: String,
    #[validate(range(min = 1, max = 5))]
    rating: i32,
    #[validate(length(min = 1))]
    comment: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AddReviewResponse {
    success: bool,
    review: Review,
}

pub(super) async fn add_review(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AddReviewRequest>,
) -> Result<Json<AddReviewResponse>, ApiError> {
    body.validate()?;
    let review = Review {
        name: body.name,
        rating: body.rating,
        comment: body.comment,
        date: Utc::now(),
    };

    let mut tx = state.db.begin().await?;
    let row: Option<(SqlJson<Vec<Review>>,)> =
        sqlx::query_as("SELECT reviews FROM bestsellers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
    let mut reviews = row
        .map(|(reviews,)| reviews.0)
        .ok_or_else(|| ApiError::not_found("Best seller"))?;
    reviews.push(review.clone());

    sqlx::query("UPDATE bestsellers SET reviews = $1 WHERE id = $2")
        .bind(SqlJson(&reviews))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Json(AddReviewResponse { success: true, review }))
}
