//! Repository for `platform_settings` and `category_prompt_settings`.

use std::collections::HashMap;

use fotoai_core::category::ProcessingType;
use fotoai_core::settings::{BackgroundPreset, BackgroundSettings, CategorySettings, SettingsSnapshot};
use sqlx::PgPool;

use crate::models::settings::{CategorySettingsRow, PlatformSettingsRow};

const PLATFORM_COLUMNS: &str = "version, maintenance_mode, maintenance_message, \
                                bkg_neutral_fragment, bkg_neutral_prompt, \
                                bkg_park_fragment, bkg_park_prompt, bkg_strength, updated_at";

const CATEGORY_COLUMNS: &str = "category, prompt, strength, guidance_scale, steps, negative_prompt";

pub struct SettingsRepo;

impl SettingsRepo {
    /// Load both settings tables inside one repeatable-read transaction so the
    /// returned snapshot is internally consistent.
    ///
    /// Returns `RowNotFound` if the singleton row is missing.
    pub async fn load_snapshot(pool: &PgPool) -> Result<SettingsSnapshot, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let platform = sqlx::query_as::<_, PlatformSettingsRow>(&format!(
            "SELECT {PLATFORM_COLUMNS} FROM platform_settings WHERE id = 1"
        ))
        .fetch_one(&mut *tx)
        .await?;

        let categories = sqlx::query_as::<_, CategorySettingsRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category_prompt_settings ORDER BY category"
        ))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(build_snapshot(platform, categories))
    }

    /// Replace the prompt of one category. Bumps the settings version.
    pub async fn set_category_prompt(
        pool: &PgPool,
        category: ProcessingType,
        prompt: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE category_prompt_settings SET prompt = $2 WHERE category = $1")
            .bind(category.tag())
            .bind(prompt)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Toggle maintenance mode. Bumps the settings version.
    pub async fn set_maintenance(
        pool: &PgPool,
        enabled: bool,
        message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE platform_settings SET maintenance_mode = $1, maintenance_message = $2 WHERE id = 1",
        )
        .bind(enabled)
        .bind(message)
        .execute(pool)
        .await?;
        Ok(())
    }
}

fn build_snapshot(
    platform: PlatformSettingsRow,
    rows: Vec<CategorySettingsRow>,
) -> SettingsSnapshot {
    let mut categories = HashMap::with_capacity(rows.len());
    for row in rows {
        let Some(category) = ProcessingType::from_tag(&row.category) else {
            tracing::warn!(category = %row.category, "Ignoring settings row for unknown category");
            continue;
        };
        categories.insert(
            category,
            CategorySettings {
                prompt: row.prompt,
                strength: row.strength,
                guidance_scale: row.guidance_scale,
                steps: row.steps,
                negative_prompt: row.negative_prompt,
            },
        );
    }

    SettingsSnapshot {
        version: platform.version,
        maintenance_mode: platform.maintenance_mode,
        maintenance_message: platform.maintenance_message,
        categories,
        background: BackgroundSettings {
            neutral: BackgroundPreset {
                fragment: platform.bkg_neutral_fragment,
                scene_prompt: platform.bkg_neutral_prompt,
            },
            scene: BackgroundPreset {
                fragment: platform.bkg_park_fragment,
                scene_prompt: platform.bkg_park_prompt,
            },
            strength_override: platform.bkg_strength,
        },
    }
}
