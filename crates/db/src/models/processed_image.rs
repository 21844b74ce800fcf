//! Processed image (processing result) model and DTOs.

use fotoai_core::types::{DbId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Full row from the `processed_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProcessedImage {
    pub id: DbId,
    pub user_id: UserId,
    pub project_id: Option<Uuid>,
    pub processed_file_path: String,
    pub processing_type: String,
    pub ai_model_used: String,
    pub source_image_path: String,
    pub prompt_used: String,
    pub processing_parameters: serde_json::Value,
    pub processing_time_ms: i64,
    pub created_at: Timestamp,
}

/// DTO for inserting a processed image row.
#[derive(Debug)]
pub struct CreateProcessedImage<'a> {
    pub user_id: UserId,
    pub project_id: Option<Uuid>,
    pub processed_file_path: &'a str,
    pub processing_type: &'a str,
    pub ai_model_used: &'a str,
    pub source_image_path: &'a str,
    pub prompt_used: &'a str,
    pub processing_parameters: &'a serde_json::Value,
    pub processing_time_ms: i64,
}
