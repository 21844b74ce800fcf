//! Enhancement invoker and the provider failure policy.

use fotoai_core::artifact::{declared_image_type, sniff_image_type, ArtifactRef, ProviderError};
use fotoai_core::ports::{ArtifactFetcher, EnhancementProvider};
use fotoai_core::resolve::ResolvedConfig;

use crate::error::PipelineError;
use crate::options::FailurePolicy;

/// Outcome of the primary enhancement step.
#[derive(Debug)]
pub enum Enhancement {
    Enhanced(ArtifactRef),
    /// The provider call failed and the policy chose to answer with the
    /// untouched upload.
    Original { source_url: String },
}

pub async fn enhance(
    provider: &dyn EnhancementProvider,
    policy: FailurePolicy,
    source_url: &str,
    config: &ResolvedConfig,
) -> Result<Enhancement, PipelineError> {
    match provider.enhance(source_url, config).await {
        Ok(artifact) => Ok(Enhancement::Enhanced(artifact)),
        Err(ProviderError::Call { status, diagnostic })
            if policy == FailurePolicy::FallbackToOriginal =>
        {
            tracing::warn!(
                status = ?status,
                diagnostic = %diagnostic,
                category = %config.category,
                "Enhancement provider failed, falling back to the original upload (no charge)"
            );
            Ok(Enhancement::Original {
                source_url: source_url.to_string(),
            })
        }
        Err(e) => Err(PipelineError::from_enhancement(e)),
    }
}

/// Enhanced image payload ready for storage.
#[derive(Debug)]
pub struct ArtifactBytes {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
}

impl ArtifactBytes {
    /// Wrap a payload. A recognised declared type wins; otherwise the type
    /// comes from the magic bytes.
    pub fn typed(bytes: Vec<u8>, declared: Option<&str>) -> Self {
        let (content_type, extension) = declared
            .and_then(declared_image_type)
            .unwrap_or_else(|| sniff_image_type(&bytes));
        Self {
            bytes,
            content_type,
            extension,
        }
    }
}

/// Materialise an artifact. Hosted artifacts are downloaded; a failed
/// download counts as a failed provider exchange.
pub async fn load(
    fetcher: &dyn ArtifactFetcher,
    artifact: ArtifactRef,
) -> Result<ArtifactBytes, PipelineError> {
    let (bytes, declared) = match artifact {
        ArtifactRef::Bytes {
            bytes,
            content_type,
        } => (bytes, content_type),
        ArtifactRef::Url(url) => {
            let bytes = fetcher.fetch(&url).await.map_err(|e| match e {
                ProviderError::Call { status, diagnostic } => PipelineError::ProviderCallFailed {
                    status,
                    diagnostic: format!("downloading enhanced artifact: {diagnostic}"),
                },
                ProviderError::InvalidResponse { diagnostic } => {
                    PipelineError::ProviderResponseInvalid { diagnostic }
                }
            })?;
            (bytes, None)
        }
    };

    if bytes.is_empty() {
        return Err(PipelineError::ProviderResponseInvalid {
            diagnostic: "enhanced artifact is empty".to_string(),
        });
    }
    Ok(ArtifactBytes::typed(bytes, declared.as_deref()))
}
