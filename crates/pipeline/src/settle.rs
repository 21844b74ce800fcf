//! Result settlement: store, charge, record. In that order, each step only
//! after the previous one succeeded.
//!
//! Storage and the database share no transaction. A failure after the upload
//! leaves an orphaned object behind; the orphan sweep reclaims it.

use fotoai_core::ports::{
    CreditLedger, NewProcessingResult, ObjectStore, ResultStore, StoredObject,
};
use fotoai_core::types::UserId;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::invoke::ArtifactBytes;

/// Credits charged per successful enhancement.
pub const CREDITS_PER_RUN: i32 = 1;

/// Everything the result row needs besides the stored path.
#[derive(Debug, Clone)]
pub struct ResultMetadata {
    pub project_id: Option<Uuid>,
    pub processing_type: String,
    pub model_used: String,
    pub source_image_path: String,
    pub prompt_used: String,
    pub processing_parameters: serde_json::Value,
    pub processing_time_ms: i64,
}

/// Fresh, user-scoped object path. Never reused, so uploads never collide.
pub fn artifact_path(user_id: UserId, extension: &str) -> String {
    format!("{user_id}/{}.{extension}", Uuid::new_v4())
}

pub async fn settle(
    storage: &dyn ObjectStore,
    credits: &dyn CreditLedger,
    results: &dyn ResultStore,
    user_id: UserId,
    artifact: ArtifactBytes,
    metadata: ResultMetadata,
) -> Result<StoredObject, PipelineError> {
    let path = artifact_path(user_id, artifact.extension);

    let stored = storage
        .put_artifact(&path, artifact.bytes, artifact.content_type)
        .await
        .map_err(|e| PipelineError::StorageWriteFailed {
            diagnostic: e.to_string(),
        })?;

    match credits.try_decrement(user_id, CREDITS_PER_RUN).await {
        Ok(Some(balance)) => {
            tracing::debug!(user_id = %user_id, remaining = balance, "Credit deducted");
        }
        Ok(None) => {
            // Another request from the same user spent the last credit first.
            tracing::warn!(
                user_id = %user_id,
                orphaned_path = %stored.path,
                "Credit decrement guard did not match; artifact left orphaned"
            );
            return Err(PipelineError::InsufficientCredits);
        }
        Err(e) => {
            tracing::error!(
                user_id = %user_id,
                orphaned_path = %stored.path,
                error = %e,
                "Credit decrement failed; artifact left orphaned"
            );
            return Err(PipelineError::SettlementFailed {
                diagnostic: format!("credit decrement: {e}"),
            });
        }
    }

    let record = NewProcessingResult {
        user_id,
        project_id: metadata.project_id,
        processed_file_path: stored.path.clone(),
        processing_type: metadata.processing_type,
        model_used: metadata.model_used,
        source_image_path: metadata.source_image_path,
        prompt_used: metadata.prompt_used,
        processing_parameters: metadata.processing_parameters,
        processing_time_ms: metadata.processing_time_ms,
    };

    match results.insert(&record).await {
        Ok(row) => {
            tracing::info!(
                user_id = %user_id,
                result_id = row.id,
                stored_path = %stored.path,
                "Processing result recorded"
            );
            Ok(stored)
        }
        Err(e) => {
            tracing::error!(
                user_id = %user_id,
                orphaned_path = %stored.path,
                error = %e,
                "Recording processing result failed after the credit was charged"
            );
            Err(PipelineError::SettlementFailed {
                diagnostic: format!("result insert: {e}"),
            })
        }
    }
}
