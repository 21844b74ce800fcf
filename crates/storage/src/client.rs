//! HTTP client for the storage REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use fotoai_core::error::CoreError;
use fotoai_core::ports::{ObjectStore, StoredObject};
use serde::Deserialize;

use crate::config::StorageConfig;

/// Client bound to one storage project and its two buckets.
#[derive(Clone)]
pub struct StorageClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    upload_bucket: String,
    processed_bucket: String,
}

/// One entry of a bucket listing. Folders come back with no `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub id: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl StorageEntry {
    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

/// Errors from the storage REST layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Storage returned a non-2xx status code.
    #[error("Storage API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The object path is empty, absolute, or escapes its bucket.
    #[error("Invalid object path '{0}'")]
    InvalidPath(String),
}

impl StorageError {
    fn into_core(self, context: &str) -> CoreError {
        match self {
            StorageError::ApiError { status: 400 | 404, body } => {
                CoreError::NotFound(format!("{context}: {body}"))
            }
            StorageError::InvalidPath(path) => {
                CoreError::Validation(format!("{context}: invalid object path '{path}'"))
            }
            other => CoreError::Upstream(format!("{context}: {other}")),
        }
    }
}

impl StorageClient {
    /// Build a client from configuration.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            upload_bucket: config.upload_bucket.clone(),
            processed_bucket: config.processed_bucket.clone(),
        })
    }

    pub fn processed_bucket(&self) -> &str {
        &self.processed_bucket
    }

    /// Mint a signed download URL valid for `ttl`.
    ///
    /// Sends `POST /storage/v1/object/sign/{bucket}/{path}`.
    pub async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let path = validate_object_path(path)?;
        let response = self
            .authorized(self.client.post(self.object_url(&format!("sign/{bucket}"), path)))
            .json(&serde_json::json!({ "expiresIn": ttl.as_secs() }))
            .send()
            .await?;

        let signed: SignResponse = Self::parse_response(response).await?;
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }

    /// Upload `bytes` to `bucket/path`, refusing to overwrite.
    ///
    /// Sends `POST /storage/v1/object/{bucket}/{path}` with `x-upsert: false`.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = validate_object_path(path)?;
        let response = self
            .authorized(self.client.post(self.object_url(bucket, path)))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// List one page of entries directly under `prefix`.
    pub async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<StorageEntry>, StorageError> {
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/storage/v1/object/list/{bucket}", self.base_url)),
            )
            .json(&serde_json::json!({
                "prefix": prefix,
                "limit": limit,
                "offset": offset,
                "sortBy": { "column": "name", "order": "asc" },
            }))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Delete objects by full path.
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }
        let response = self
            .authorized(
                self.client
                    .delete(format!("{}/storage/v1/object/{bucket}", self.base_url)),
            )
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Public URL of an object in a public bucket. No request is made.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{}",
            self.base_url,
            path.trim_start_matches('/')
        )
    }

    // ---- private helpers ----

    fn object_url(&self, bucket_segment: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket_segment}/{path}", self.base_url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    /// Ensure the response has a success status code, otherwise capture the
    /// status and body in a [`StorageError::ApiError`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StorageError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StorageError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), StorageError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Reject paths that are empty, absolute, or contain `..` segments.
fn validate_object_path(path: &str) -> Result<&str, StorageError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.split('/').any(|segment| segment.is_empty() || segment == "..");
    if invalid {
        Err(StorageError::InvalidPath(path.to_string()))
    } else {
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn signed_source_url(&self, path: &str, ttl: Duration) -> Result<String, CoreError> {
        self.create_signed_url(&self.upload_bucket, path, ttl)
            .await
            .map_err(|e| e.into_core("signing source image"))
    }

    async fn put_artifact(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, CoreError> {
        self.upload(&self.processed_bucket, path, bytes, content_type)
            .await
            .map_err(|e| e.into_core("uploading artifact"))?;

        Ok(StoredObject {
            path: path.to_string(),
            public_url: self.public_url(&self.processed_bucket, path),
        })
    }

    /// One-entry listing of the processed bucket: an authenticated round trip
    /// that touches nothing.
    async fn health_check(&self) -> Result<(), CoreError> {
        self.list(&self.processed_bucket, "", 1, 0)
            .await
            .map(|_| ())
            .map_err(|e| e.into_core("storage health check"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_paths_are_validated() {
        assert!(validate_object_path("user/photo.jpg").is_ok());
        assert!(validate_object_path("").is_err());
        assert!(validate_object_path("/user/photo.jpg").is_err());
        assert!(validate_object_path("user/../other/photo.jpg").is_err());
        assert!(validate_object_path("user//photo.jpg").is_err());
    }

    #[test]
    fn folders_have_no_id() {
        let folder: StorageEntry =
            serde_json::from_value(serde_json::json!({ "name": "abc", "id": null })).unwrap();
        assert!(folder.is_folder());
    }
}
