//! Object-storage image uploads.
//!
//! Each file is posted as a multipart form to the configured endpoint, which
//! answers with the public URL. Multi-file uploads fan out concurrently and are
//! joined before the handler responds; any single failure aborts the request.

use futures::future::try_join_all;
use serde::Deserialize;
use uuid::Uuid;

use crate::{config::UploaderConfig, error::ApiError};

#[derive(Clone)]
pub struct ImageUploader {
    http: reqwest::Client,
    endpoint: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// One file captured from a multipart request.
#[derive(Debug)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUploader {
    pub fn new(config: &UploaderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            folder: config.folder.clone(),
        }
    }

    pub async fn upload(&self, file: UploadFile) -> Result<String, ApiError> {
        let object_key = format!("{}/{}-{}", self.folder, Uuid::new_v4(), file.filename);
        let form = reqwest::multipart::Form::new()
            .text("folder", self.folder.clone())
            .text("public_id", object_key)
            .part(
                "file",
                reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename),
            );

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Upstream(format!(
                "image upload failed with status {}",
                response.status()
            )));
        }
        let body: UploadResponse = response.json().await?;
        Ok(body.secure_url)
    }

    /// Upload every file concurrently, preserving input order in the result.
    pub async fn upload_all(&self, files: Vec<UploadFile>) -> Result<Vec<String>, ApiError> {
        try_join_all(files.into_iter().map(|file| self.upload(file))).await
    }
}
