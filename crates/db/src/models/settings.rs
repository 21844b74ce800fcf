//! Platform settings rows.

use fotoai_core::types::Timestamp;
use sqlx::FromRow;

/// The singleton `platform_settings` row.
#[derive(Debug, Clone, FromRow)]
pub struct PlatformSettingsRow {
    pub version: i64,
    pub maintenance_mode: bool,
    pub maintenance_message: Option<String>,
    pub bkg_neutral_fragment: String,
    pub bkg_neutral_prompt: String,
    pub bkg_park_fragment: String,
    pub bkg_park_prompt: String,
    pub bkg_strength: f64,
    pub updated_at: Timestamp,
}

/// One row of `category_prompt_settings`.
#[derive(Debug, Clone, FromRow)]
pub struct CategorySettingsRow {
    pub category: String,
    pub prompt: Option<String>,
    pub strength: f64,
    pub guidance_scale: f64,
    pub steps: i32,
    pub negative_prompt: Option<String>,
}
