//! User entity model and DTOs.

use fotoai_core::types::{Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub user_type: String,
    pub remaining_images: i32,
    pub total_images_processed: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for provisioning a user row (the identity provider owns the id).
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub remaining_images: i32,
}
