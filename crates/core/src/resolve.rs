//! Configuration resolution: category tag + background option -> generation
//! parameters.
//!
//! Pure over a [`SettingsSnapshot`]; no I/O happens here.

use serde::Serialize;

use crate::background::BackgroundOption;
use crate::category::ProcessingType;
use crate::settings::SettingsSnapshot;

/// Fully resolved parameters for one enhancement call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub category: ProcessingType,
    pub background: BackgroundOption,
    pub prompt: String,
    pub strength: f64,
    pub guidance_scale: f64,
    pub steps: i32,
    pub negative_prompt: Option<String>,
    /// Scene prompt for the background generation provider. Present only when
    /// the background is being replaced and the option has a non-blank prompt.
    pub scene_prompt: Option<String>,
    /// Version of the settings snapshot this was resolved from.
    pub settings_version: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Unknown processing category '{0}'")]
    UnknownCategory(String),

    #[error("No prompt configured for category '{0}'")]
    MissingPrompt(ProcessingType),
}

/// Resolve the parameters for `tag` under `background`.
///
/// When the background is replaced, the option's fragment is appended to the
/// category prompt and the category strength is swapped for
/// [`BackgroundSettings::strength_override`](crate::settings::BackgroundSettings).
pub fn resolve(
    snapshot: &SettingsSnapshot,
    tag: &str,
    background: BackgroundOption,
) -> Result<ResolvedConfig, ResolveError> {
    let category =
        ProcessingType::from_tag(tag).ok_or_else(|| ResolveError::UnknownCategory(tag.to_string()))?;

    let settings = snapshot
        .category(category)
        .ok_or(ResolveError::MissingPrompt(category))?;

    let base_prompt = settings
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(ResolveError::MissingPrompt(category))?;

    let negative_prompt = settings
        .negative_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);

    let (prompt, strength, scene_prompt) = match snapshot.background.preset(background) {
        None => (base_prompt.to_string(), settings.strength, None),
        Some(preset) => (
            append_fragment(base_prompt, &preset.fragment),
            snapshot.background.strength_override,
            Some(preset.scene_prompt.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        ),
    };

    Ok(ResolvedConfig {
        category,
        background,
        prompt,
        strength,
        guidance_scale: settings.guidance_scale,
        steps: settings.steps,
        negative_prompt,
        scene_prompt,
        settings_version: snapshot.version,
    })
}

fn append_fragment(prompt: &str, fragment: &str) -> String {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt} {fragment}")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;
    use crate::settings::{BackgroundPreset, BackgroundSettings, CategorySettings};

    fn fixture() -> SettingsSnapshot {
        let mut categories = HashMap::new();
        categories.insert(
            ProcessingType::Food,
            CategorySettings {
                prompt: Some("Make the dish look appetizing.".into()),
                strength: 0.3,
                guidance_scale: 4.0,
                steps: 30,
                negative_prompt: Some("blurry".into()),
            },
        );
        categories.insert(
            ProcessingType::Vehicles,
            CategorySettings {
                prompt: Some("Polish the car's paint.".into()),
                strength: 0.25,
                guidance_scale: 3.0,
                steps: 24,
                negative_prompt: Some("   ".into()),
            },
        );
        categories.insert(
            ProcessingType::Products,
            CategorySettings {
                prompt: Some("  ".into()),
                ..CategorySettings::default()
            },
        );

        SettingsSnapshot {
            version: 7,
            maintenance_mode: false,
            maintenance_message: None,
            categories,
            background: BackgroundSettings {
                neutral: BackgroundPreset {
                    fragment: "Place it on a seamless neutral studio backdrop.".into(),
                    scene_prompt: "Empty photo studio, soft grey backdrop".into(),
                },
                scene: BackgroundPreset {
                    fragment: "Place it in a sunny park.".into(),
                    scene_prompt: "Green park on a sunny afternoon".into(),
                },
                strength_override: 0.9,
            },
        }
    }

    #[test]
    fn keep_uses_category_prompt_and_strength() {
        let resolved = resolve(&fixture(), "alimentos", BackgroundOption::Keep).unwrap();

        assert_eq!(resolved.category, ProcessingType::Food);
        assert_eq!(resolved.prompt, "Make the dish look appetizing.");
        assert_eq!(resolved.strength, 0.3);
        assert_eq!(resolved.guidance_scale, 4.0);
        assert_eq!(resolved.steps, 30);
        assert_eq!(resolved.negative_prompt.as_deref(), Some("blurry"));
        assert_eq!(resolved.scene_prompt, None);
        assert_eq!(resolved.settings_version, 7);
    }

    #[test]
    fn neutral_background_appends_fragment_and_overrides_strength() {
        let resolved = resolve(&fixture(), "veiculos", BackgroundOption::Neutral).unwrap();

        assert!(resolved
            .prompt
            .contains("Place it on a seamless neutral studio backdrop."));
        assert!(resolved.prompt.starts_with("Polish the car's paint."));
        assert_eq!(resolved.strength, 0.9);
        assert_ne!(resolved.strength, 0.25);
        assert_eq!(
            resolved.scene_prompt.as_deref(),
            Some("Empty photo studio, soft grey backdrop")
        );
    }

    #[test]
    fn scene_background_selects_park_prompts() {
        let resolved = resolve(&fixture(), "alimentos", BackgroundOption::Scene).unwrap();
        assert!(resolved.prompt.ends_with("Place it in a sunny park."));
        assert_eq!(
            resolved.scene_prompt.as_deref(),
            Some("Green park on a sunny afternoon")
        );
    }

    #[test]
    fn blank_scene_prompt_is_absent_but_fragment_still_applies() {
        let mut snapshot = fixture();
        snapshot.background.scene.scene_prompt = "  \n ".into();

        let resolved = resolve(&snapshot, "alimentos", BackgroundOption::Scene).unwrap();

        assert_eq!(resolved.scene_prompt, None);
        assert!(resolved.prompt.ends_with("Place it in a sunny park."));
        assert_eq!(resolved.strength, 0.9);
    }

    #[test]
    fn blank_negative_prompt_is_dropped() {
        let resolved = resolve(&fixture(), "veiculos", BackgroundOption::Keep).unwrap();
        assert_eq!(resolved.negative_prompt, None);
    }

    #[test]
    fn unknown_tag_fails() {
        assert_matches!(
            resolve(&fixture(), "barcos", BackgroundOption::Keep),
            Err(ResolveError::UnknownCategory(tag)) if tag == "barcos"
        );
    }

    #[test]
    fn unconfigured_category_fails_with_missing_prompt() {
        assert_matches!(
            resolve(&fixture(), "imoveis", BackgroundOption::Keep),
            Err(ResolveError::MissingPrompt(ProcessingType::RealEstate))
        );
    }

    #[test]
    fn blank_prompt_counts_as_missing() {
        assert_matches!(
            resolve(&fixture(), "produtos", BackgroundOption::Keep),
            Err(ResolveError::MissingPrompt(ProcessingType::Products))
        );
    }
}
