//! Repository for the `users` table.

use fotoai_core::types::UserId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, name, user_type, remaining_images, total_images_processed, \
                       is_active, created_at, updated_at";

/// Provides user lookups and the credit counter operations.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, email, name, remaining_images)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.id)
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.remaining_images)
            .fetch_one(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: UserId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Remaining credit balance of an active user.
    ///
    /// Returns `None` if the user does not exist or has been deactivated.
    pub async fn remaining_images(pool: &PgPool, id: UserId) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT remaining_images FROM users WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Conditionally spend `amount` credits in a single statement.
    ///
    /// The guard in the `WHERE` clause makes concurrent calls for the same
    /// user serialize on the row lock: once the balance cannot cover `amount`
    /// the update matches nothing and `None` is returned. Deactivated users
    /// are never charged. A successful spend also bumps
    /// `total_images_processed`.
    pub async fn try_decrement_credits(
        pool: &PgPool,
        id: UserId,
        amount: i32,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE users SET
                remaining_images = remaining_images - $2,
                total_images_processed = total_images_processed + 1
             WHERE id = $1 AND is_active = true AND remaining_images >= $2
             RETURNING remaining_images",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(pool)
        .await
    }
}
