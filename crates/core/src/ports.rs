//! Collaborator ports consumed by the enhancement pipeline.
//!
//! Each external system the pipeline talks to sits behind one narrow trait so
//! that adapters (Postgres, the storage REST API, the AI providers) live in
//! their own crates and tests can substitute in-memory doubles.

use std::time::Duration;

use async_trait::async_trait;

use crate::artifact::{ArtifactRef, ProviderError};
use crate::error::CoreError;
use crate::resolve::ResolvedConfig;
use crate::settings::SettingsSnapshot;
use crate::types::{DbId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Identity, credits, settings, results
// ---------------------------------------------------------------------------

/// Resolves a bearer token to a user id.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Fails with [`CoreError::Unauthorized`] for invalid or expired tokens.
    async fn verify(&self, token: &str) -> Result<UserId, CoreError>;
}

/// Per-user credit balance.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current `remaining_images`, or `None` if the user has no record.
    async fn remaining(&self, user_id: UserId) -> Result<Option<i32>, CoreError>;

    /// Atomically subtract `amount` if, and only if, the balance stays
    /// non-negative. Returns the new balance, or `None` when the guard did not
    /// match (balance too low or user gone).
    async fn try_decrement(&self, user_id: UserId, amount: i32) -> Result<Option<i32>, CoreError>;
}

/// Source of the singleton settings record.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn snapshot(&self) -> Result<SettingsSnapshot, CoreError>;
}

/// Metadata for a finished enhancement, inserted once per settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProcessingResult {
    pub user_id: UserId,
    pub project_id: Option<uuid::Uuid>,
    pub processed_file_path: String,
    pub processing_type: String,
    pub model_used: String,
    pub source_image_path: String,
    pub prompt_used: String,
    pub processing_parameters: serde_json::Value,
    pub processing_time_ms: i64,
}

/// A persisted processing result.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResultRecord {
    pub id: DbId,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn insert(&self, result: &NewProcessingResult) -> Result<ProcessingResultRecord, CoreError>;
}

// ---------------------------------------------------------------------------
// Object storage
// ---------------------------------------------------------------------------

/// Location of an artifact written to object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Path inside the processed-artifacts bucket.
    pub path: String,
    /// URL the caller can load the artifact from.
    pub public_url: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Mint a time-boxed, provider-fetchable URL for an uploaded source image.
    async fn signed_source_url(&self, path: &str, ttl: Duration) -> Result<String, CoreError>;

    /// Write a finished artifact. Never overwrites an existing object.
    async fn put_artifact(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, CoreError>;

    /// Cheap reachability probe for health reporting.
    async fn health_check(&self) -> Result<(), CoreError>;
}

// ---------------------------------------------------------------------------
// AI providers
// ---------------------------------------------------------------------------

/// Primary image-enhancement provider. Blocks until a terminal result exists.
#[async_trait]
pub trait EnhancementProvider: Send + Sync {
    async fn enhance(
        &self,
        image_url: &str,
        config: &ResolvedConfig,
    ) -> Result<ArtifactRef, ProviderError>;

    /// Model identifier recorded alongside results.
    fn model_name(&self) -> &str;
}

/// Isolates the foreground subject, returning a URL to a transparent cut-out.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    async fn remove_background(&self, image_url: &str) -> Result<String, ProviderError>;
}

/// Generates a replacement background from a scene prompt.
#[async_trait]
pub trait BackgroundGenerator: Send + Sync {
    async fn generate_background(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Downloads provider-hosted artifacts.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}
