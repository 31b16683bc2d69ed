//! Request-boundary error type.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl maps
//! the taxonomy onto the wire contract: a JSON body of `{"error": "<string>"}`
//! with 400 for bad input, 404 for missing entities, 500 for everything else.

use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::domain::{
    cart::CartError,
    order::InvalidReturnAction,
    stock::StockError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Not enough stock")]
    InsufficientStock,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InsufficientStock | Self::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        // Internal details stay in the log, not the response body.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<CartError> for ApiError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::LineNotFound => Self::NotFound("Item not found in cart".into()),
            CartError::ZeroQuantity => Self::Validation(e.to_string()),
        }
    }
}

impl From<StockError> for ApiError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::VariantNotFound => Self::NotFound("Variant not found".into()),
            StockError::Insufficient => Self::InsufficientStock,
        }
    }
}

impl From<InvalidReturnAction> for ApiError {
    fn from(e: InvalidReturnAction) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(e: bcrypt::BcryptError) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Upstream(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let resp = ApiError::Validation("Invalid product or user ID".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = ApiError::not_found("Cart").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn insufficient_stock_maps_to_400() {
        let resp = ApiError::from(StockError::Insufficient).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_variant_maps_to_404() {
        let resp = ApiError::from(StockError::VariantNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_return_action_maps_to_400() {
        let resp = ApiError::from(InvalidReturnAction).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_maps_to_500() {
        let resp = ApiError::Upstream("storage quota exceeded".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let resp = ApiError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
