//! Repository for the `processed_images` table.

use fotoai_core::types::{DbId, UserId};
use sqlx::PgPool;

use crate::models::processed_image::{CreateProcessedImage, ProcessedImage};

const COLUMNS: &str = "id, user_id, project_id, processed_file_path, processing_type, \
                       ai_model_used, source_image_path, prompt_used, processing_parameters, \
                       processing_time_ms, created_at";

pub struct ProcessedImageRepo;

impl ProcessedImageRepo {
    /// Insert a processed image row, returning it.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProcessedImage<'_>,
    ) -> Result<ProcessedImage, sqlx::Error> {
        let query = format!(
            "INSERT INTO processed_images
                (user_id, project_id, processed_file_path, processing_type, ai_model_used,
                 source_image_path, prompt_used, processing_parameters, processing_time_ms)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProcessedImage>(&query)
            .bind(input.user_id)
            .bind(input.project_id)
            .bind(input.processed_file_path)
            .bind(input.processing_type)
            .bind(input.ai_model_used)
            .bind(input.source_image_path)
            .bind(input.prompt_used)
            .bind(input.processing_parameters)
            .bind(input.processing_time_ms)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProcessedImage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM processed_images WHERE id = $1");
        sqlx::query_as::<_, ProcessedImage>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All results for a user, newest first.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Vec<ProcessedImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM processed_images WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ProcessedImage>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Subset of `paths` referenced by at least one row.
    pub async fn referenced_paths(
        pool: &PgPool,
        paths: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, String>(
            "SELECT processed_file_path FROM processed_images WHERE processed_file_path = ANY($1)",
        )
        .bind(paths)
        .fetch_all(pool)
        .await
    }
}
