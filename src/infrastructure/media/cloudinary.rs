use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::media::{MediaStorage, MediaStorageError, UploadFile, UploadedMedia};

const CLOUDINARY_API_URL: &str = "https://api.cloudinary.com/v1_1";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorDetail,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}

/// Uploads images to Cloudinary with an unsigned upload preset
pub struct CloudinaryStorage {
    upload_url: String,
    upload_preset: String,
    http_client: reqwest::Client,
}

impl CloudinaryStorage {
    pub fn new(cloud_name: &str, upload_preset: String) -> Self {
        Self::with_base_url(CLOUDINARY_API_URL, cloud_name, upload_preset)
    }

    /// Point at a different API host (self-hosted proxy, local fake)
    pub fn with_base_url(base_url: &str, cloud_name: &str, upload_preset: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            upload_url: format!(
                "{}/{}/auto/upload",
                base_url.trim_end_matches('/'),
                cloud_name
            ),
            upload_preset,
            http_client,
        }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, file: UploadFile) -> Result<UploadedMedia, MediaStorageError> {
        if file.is_empty() {
            return Err(MediaStorageError::EmptyFile);
        }

        let mut part = Part::bytes(file.bytes).file_name(file.file_name.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| MediaStorageError::Request(e.to_string()))?;
        }

        let form = Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .http_client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaStorageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<CloudinaryErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MediaStorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: CloudinaryUploadResponse = response
            .json()
            .await
            .map_err(|e| MediaStorageError::Request(format!("Failed to parse response: {}", e)))?;

        let url = body
            .secure_url
            .or(body.url)
            .ok_or(MediaStorageError::MissingUrl)?;

        tracing::info!(file_name = %file.file_name, url = %url, "Uploaded file to media host");
        Ok(UploadedMedia { url })
    }
}
