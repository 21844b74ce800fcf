//! Postgres-backed implementations of the pipeline's data-store ports.

use async_trait::async_trait;
use fotoai_core::error::CoreError;
use fotoai_core::ports::{
    CreditLedger, NewProcessingResult, ProcessingResultRecord, ResultStore, SettingsSource,
};
use fotoai_core::settings::SettingsSnapshot;
use fotoai_core::types::UserId;

use crate::models::processed_image::CreateProcessedImage;
use crate::repositories::{ProcessedImageRepo, SettingsRepo, UserRepo};
use crate::DbPool;

/// Credit ledger, settings source and result store over one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &str, err: sqlx::Error) -> CoreError {
    CoreError::Internal(format!("{context}: {err}"))
}

#[async_trait]
impl CreditLedger for PgStore {
    async fn remaining(&self, user_id: UserId) -> Result<Option<i32>, CoreError> {
        UserRepo::remaining_images(&self.pool, user_id)
            .await
            .map_err(|e| db_error("loading credit balance", e))
    }

    async fn try_decrement(&self, user_id: UserId, amount: i32) -> Result<Option<i32>, CoreError> {
        UserRepo::try_decrement_credits(&self.pool, user_id, amount)
            .await
            .map_err(|e| db_error("decrementing credits", e))
    }
}

#[async_trait]
impl SettingsSource for PgStore {
    async fn snapshot(&self) -> Result<SettingsSnapshot, CoreError> {
        SettingsRepo::load_snapshot(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    CoreError::NotFound("platform settings record".to_string())
                }
                other => db_error("loading platform settings", other),
            })
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn insert(&self, result: &NewProcessingResult) -> Result<ProcessingResultRecord, CoreError> {
        let row = ProcessedImageRepo::create(
            &self.pool,
            &CreateProcessedImage {
                user_id: result.user_id,
                project_id: result.project_id,
                processed_file_path: &result.processed_file_path,
                processing_type: &result.processing_type,
                ai_model_used: &result.model_used,
                source_image_path: &result.source_image_path,
                prompt_used: &result.prompt_used,
                processing_parameters: &result.processing_parameters,
                processing_time_ms: result.processing_time_ms,
            },
        )
        .await
        .map_err(|e| db_error("inserting processing result", e))?;

        Ok(ProcessingResultRecord {
            id: row.id,
            created_at: row.created_at,
        })
    }
}
