use base64::{engine::general_purpose, Engine as _};
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ImageSettings;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ImageData {
    pub data: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileType")]
    pub file_type: String,
    #[serde(rename = "fileSize", default)]
    pub file_size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageUploadError {
    #[error("Base64 decode error: {0}")]
    Base64Decode(String),

    #[error("GCS upload error: {0}")]
    Gcs(String),

    #[error("Invalid image format: {0}")]
    InvalidImageFormat(String),

    #[error("Image download failed: {0}")]
    Download(String),

    #[error("Image storage is not configured")]
    NotConfigured,
}

/// A decoded image ready for upload.
#[derive(Debug)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: &'static str,
}

pub fn file_extension(file_type: &str) -> Result<&'static str, ImageUploadError> {
    match file_type {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/gif" => Ok("gif"),
        "image/webp" => Ok("webp"),
        _ => Err(ImageUploadError::InvalidImageFormat(format!(
            "Unsupported file type: {}",
            file_type
        ))),
    }
}

/// Accepts raw base64 or a `data:` URL.
pub fn decode_image(image: &ImageData) -> Result<DecodedImage, ImageUploadError> {
    let base64_data = if image.data.starts_with("data:") {
        image.data.split(',').nth(1).ok_or_else(|| {
            ImageUploadError::InvalidImageFormat("Invalid base64 data format".to_string())
        })?
    } else {
        &image.data
    };

    let extension = file_extension(&image.file_type)?;
    let bytes = general_purpose::STANDARD
        .decode(base64_data.trim())
        .map_err(|e| ImageUploadError::Base64Decode(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ImageUploadError::InvalidImageFormat(
            "Image is empty".to_string(),
        ));
    }

    Ok(DecodedImage {
        bytes,
        content_type: image.file_type.clone(),
        extension,
    })
}

struct Bucket {
    client: Client,
    name: String,
}

/// Uploads to Google Cloud Storage. Without a bucket every upload fails with
/// `NotConfigured`.
pub struct ImageService {
    bucket: Option<Bucket>,
}

impl ImageService {
    pub fn disabled() -> Self {
        Self { bucket: None }
    }

    pub async fn from_settings(settings: &ImageSettings) -> Self {
        let Some(name) = settings.bucket.clone() else {
            log::info!("IMAGE_BUCKET not set; image uploads are disabled");
            return Self::disabled();
        };

        match ClientConfig::default().with_auth().await {
            Ok(config) => Self {
                bucket: Some(Bucket {
                    client: Client::new(config),
                    name,
                }),
            },
            Err(e) => {
                log::warn!("Failed to create GCS client, image uploads disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bucket.is_some()
    }

    /// Uploads each image independently; one failure does not stop the batch.
    pub async fn upload_images(
        &self,
        images: Vec<DecodedImage>,
        prefix: &str,
    ) -> Vec<Result<String, ImageUploadError>> {
        let mut results = Vec::with_capacity(images.len());
        for image in images {
            let result = self.upload(image, prefix).await;
            if let Err(e) = &result {
                log::warn!("Failed to upload image under {}: {}", prefix, e);
            }
            results.push(result);
        }
        results
    }

    pub async fn upload(&self, image: DecodedImage, prefix: &str) -> Result<String, ImageUploadError> {
        let bucket = self.bucket.as_ref().ok_or(ImageUploadError::NotConfigured)?;

        let object_name = format!(
            "{}/{}-{}.{}",
            prefix,
            chrono::Utc::now().timestamp(),
            Uuid::new_v4(),
            image.extension
        );
        let mut media = Media::new(object_name.clone());
        media.content_type = image.content_type.into();

        let upload_request = UploadObjectRequest {
            bucket: bucket.name.clone(),
            ..Default::default()
        };
        bucket
            .client
            .upload_object(&upload_request, image.bytes, &UploadType::Simple(media))
            .await
            .map_err(|e| ImageUploadError::Gcs(format!("Failed to upload to GCS: {}", e)))?;

        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            bucket.name, object_name
        ))
    }

    /// Copies a remote image (a provider avatar) into the bucket.
    pub async fn mirror_remote(
        &self,
        http: &ReqwestClient,
        url: &str,
        prefix: &str,
    ) -> Result<String, ImageUploadError> {
        if !self.is_enabled() {
            return Err(ImageUploadError::NotConfigured);
        }

        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| ImageUploadError::Download(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ImageUploadError::Download(format!(
                "status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());
        let extension = file_extension(&content_type)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageUploadError::Download(e.to_string()))?;

        self.upload(
            DecodedImage {
                bytes: bytes.to_vec(),
                content_type,
                extension,
            },
            prefix,
        )
        .await
    }
}
