//! Background replacement sub-pipeline.
//!
//! Foreground isolation and background generation are independent, so they
//! run concurrently and the first failure short-circuits the pair.

use fotoai_core::artifact::ProviderError;
use fotoai_core::compose::{compose, ComposeError};
use fotoai_core::ports::{ArtifactFetcher, BackgroundGenerator, BackgroundRemover};

use crate::error::PipelineError;

/// Both layers of a replaced background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers {
    pub foreground_url: String,
    pub background_url: String,
}

/// Isolate the subject of the enhanced image and generate a new scene.
///
/// `enhanced_url` must be the enhanced artifact, not the raw upload.
pub async fn replace_background(
    remover: &dyn BackgroundRemover,
    generator: &dyn BackgroundGenerator,
    enhanced_url: &str,
    scene_prompt: &str,
) -> Result<Layers, PipelineError> {
    let isolate = async {
        let url = remover
            .remove_background(enhanced_url)
            .await
            .map_err(PipelineError::from_background_removal)?;
        non_empty(url).ok_or_else(|| PipelineError::BackgroundRemovalFailed {
            diagnostic: "empty foreground URL".to_string(),
        })
    };
    let generate = async {
        let url = generator
            .generate_background(scene_prompt)
            .await
            .map_err(PipelineError::from_background_generation)?;
        non_empty(url).ok_or_else(|| PipelineError::BackgroundGenerationFailed {
            diagnostic: "empty background URL".to_string(),
        })
    };

    let (foreground_url, background_url) = tokio::try_join!(isolate, generate)?;
    Ok(Layers {
        foreground_url,
        background_url,
    })
}

fn non_empty(url: String) -> Option<String> {
    (!url.trim().is_empty()).then_some(url)
}

/// Why server-side compositing did not produce an image.
#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error("fetching {layer} layer: {source}")]
    Fetch {
        layer: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("compositing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Download both layers and composite them on the blocking pool.
pub async fn composite(
    fetcher: &dyn ArtifactFetcher,
    layers: &Layers,
) -> Result<Vec<u8>, CompositeError> {
    let (background, foreground) = tokio::try_join!(
        async {
            fetcher
                .fetch(&layers.background_url)
                .await
                .map_err(|source| CompositeError::Fetch {
                    layer: "background",
                    source,
                })
        },
        async {
            fetcher
                .fetch(&layers.foreground_url)
                .await
                .map_err(|source| CompositeError::Fetch {
                    layer: "foreground",
                    source,
                })
        },
    )?;

    let composed = tokio::task::spawn_blocking(move || compose(&background, &foreground)).await??;
    Ok(composed)
}
