//! Wire shapes of a processing request and its response.

use fotoai_core::background::BackgroundOption;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

/// Body of `POST /api/v1/process-image`, as received.
///
/// Every field is optional at the wire level so that a missing field is
/// reported through the pipeline's own error envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    pub image_path: Option<String>,
    pub processing_type: Option<String>,
    pub project_id: Option<String>,
    pub background_option: Option<String>,
}

/// A request that passed [`ProcessRequest::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub image_path: String,
    /// Raw category tag. Resolved against the settings snapshot later.
    pub processing_type: String,
    pub project_id: Option<Uuid>,
    pub background: BackgroundOption,
}

impl ProcessRequest {
    pub fn validate(self) -> Result<ValidatedRequest, PipelineError> {
        let image_path = non_blank(self.image_path);
        let processing_type = non_blank(self.processing_type);
        let (Some(image_path), Some(processing_type)) = (image_path, processing_type) else {
            return Err(PipelineError::InvalidRequest(
                "Parâmetros 'image_path' ou 'processing_type' ausentes.".to_string(),
            ));
        };

        let project_id = non_blank(self.project_id)
            .map(|raw| {
                Uuid::parse_str(&raw).map_err(|_| {
                    PipelineError::InvalidRequest(format!("'project_id' inválido: '{raw}'"))
                })
            })
            .transpose()?;

        let background = BackgroundOption::parse(self.background_option.as_deref().map(str::trim))
            .map_err(|_| {
                PipelineError::InvalidRequest(format!(
                    "'background_option' inválido: '{}'",
                    self.background_option.as_deref().unwrap_or_default()
                ))
            })?;

        Ok(ValidatedRequest {
            image_path,
            processing_type,
            project_id,
            background,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Successful pipeline output.
///
/// `processed_file_path` is absent when nothing was stored (fallback to the
/// original upload). The layer URLs are present only after a successful
/// background replacement; `enhanced_url` only when compositing ran
/// server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_file_path: Option<String>,
    pub processed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_url: Option<String>,
}
