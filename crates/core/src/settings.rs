//! Immutable snapshot of the platform settings record.
//!
//! The pipeline loads one snapshot at the start of each invocation and passes
//! it explicitly to the resolver, so resolution never observes a settings
//! update half-way through a run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::background::BackgroundOption;
use crate::category::ProcessingType;

/// Default touch-up strength when a category row omits one.
pub const DEFAULT_STRENGTH: f64 = 0.35;
/// Default classifier-free guidance scale.
pub const DEFAULT_GUIDANCE_SCALE: f64 = 3.5;
/// Default number of inference steps.
pub const DEFAULT_STEPS: i32 = 28;
/// Default strength for background-replacement runs.
pub const DEFAULT_BACKGROUND_STRENGTH: f64 = 0.85;

/// Per-category prompt and generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySettings {
    /// Base prompt. `None` (or blank) means the category is not configured.
    pub prompt: Option<String>,
    pub strength: f64,
    pub guidance_scale: f64,
    pub steps: i32,
    pub negative_prompt: Option<String>,
}

impl Default for CategorySettings {
    fn default() -> Self {
        Self {
            prompt: None,
            strength: DEFAULT_STRENGTH,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            steps: DEFAULT_STEPS,
            negative_prompt: None,
        }
    }
}

/// Prompts used for one replacement background.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundPreset {
    /// Appended to the enhancement prompt of every category.
    pub fragment: String,
    /// Sent to the background generation provider.
    pub scene_prompt: String,
}

/// Background replacement configuration shared by all categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSettings {
    pub neutral: BackgroundPreset,
    pub scene: BackgroundPreset,
    /// Replaces the category strength whenever the background changes.
    pub strength_override: f64,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            neutral: BackgroundPreset::default(),
            scene: BackgroundPreset::default(),
            strength_override: DEFAULT_BACKGROUND_STRENGTH,
        }
    }
}

impl BackgroundSettings {
    /// Preset for a replacement option; `None` for [`BackgroundOption::Keep`].
    pub fn preset(&self, option: BackgroundOption) -> Option<&BackgroundPreset> {
        match option {
            BackgroundOption::Keep => None,
            BackgroundOption::Neutral => Some(&self.neutral),
            BackgroundOption::Scene => Some(&self.scene),
        }
    }
}

/// Versioned, read-only copy of the singleton settings record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// Incremented on every administrative update of the record.
    pub version: i64,
    pub maintenance_mode: bool,
    pub maintenance_message: Option<String>,
    pub categories: HashMap<ProcessingType, CategorySettings>,
    pub background: BackgroundSettings,
}

impl SettingsSnapshot {
    pub fn category(&self, category: ProcessingType) -> Option<&CategorySettings> {
        self.categories.get(&category)
    }
}
