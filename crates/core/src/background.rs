//! Background replacement options selected by the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const OPTION_KEEP: &str = "manter";
pub const OPTION_NEUTRAL: &str = "neutro";
pub const OPTION_SCENE: &str = "parque";

const VALID_OPTIONS: &[&str] = &[OPTION_KEEP, OPTION_NEUTRAL, OPTION_SCENE];

/// What to do with the photograph's original background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundOption {
    /// Leave the scene as photographed.
    #[default]
    Keep,
    /// Replace with a neutral studio backdrop.
    Neutral,
    /// Replace with an outdoor park scene.
    Scene,
}

impl BackgroundOption {
    /// Parse the optional wire value. An absent value means [`Self::Keep`].
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value {
            None | Some(OPTION_KEEP) => Ok(Self::Keep),
            Some(OPTION_NEUTRAL) => Ok(Self::Neutral),
            Some(OPTION_SCENE) => Ok(Self::Scene),
            Some(other) => Err(CoreError::Validation(format!(
                "Invalid background option '{other}'. Must be one of: {}",
                VALID_OPTIONS.join(", ")
            ))),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Keep => OPTION_KEEP,
            Self::Neutral => OPTION_NEUTRAL,
            Self::Scene => OPTION_SCENE,
        }
    }

    /// Whether this option triggers the background replacement sub-pipeline.
    pub fn replaces_background(self) -> bool {
        !matches!(self, Self::Keep)
    }
}

impl fmt::Display for BackgroundOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn missing_option_means_keep() {
        assert_eq!(BackgroundOption::parse(None).unwrap(), BackgroundOption::Keep);
        assert_eq!(
            BackgroundOption::parse(Some("manter")).unwrap(),
            BackgroundOption::Keep
        );
    }

    #[test]
    fn replacement_options_parse() {
        assert_eq!(
            BackgroundOption::parse(Some("neutro")).unwrap(),
            BackgroundOption::Neutral
        );
        assert_eq!(
            BackgroundOption::parse(Some("parque")).unwrap(),
            BackgroundOption::Scene
        );
    }

    #[test]
    fn unknown_option_is_a_validation_error() {
        assert_matches!(
            BackgroundOption::parse(Some("praia")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn only_keep_skips_replacement() {
        assert!(!BackgroundOption::Keep.replaces_background());
        assert!(BackgroundOption::Neutral.replaces_background());
        assert!(BackgroundOption::Scene.replaces_background());
    }
}
