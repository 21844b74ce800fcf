//! The enhancement pipeline: gate, resolve, sign, enhance, optional
//! background replacement, settle, respond.

use std::sync::Arc;
use std::time::Instant;

use fotoai_core::compose::COMPOSITE_CONTENT_TYPE;
use fotoai_core::ports::{
    ArtifactFetcher, BackgroundGenerator, BackgroundRemover, CreditLedger, EnhancementProvider,
    IdentityVerifier, ObjectStore, ResultStore, SettingsSource,
};
use fotoai_core::resolve::{resolve, ResolveError, ResolvedConfig};
use serde_json::json;

use crate::background::{self, Layers};
use crate::error::PipelineError;
use crate::gate;
use crate::invoke::{self, ArtifactBytes, Enhancement};
use crate::options::{CompositeMode, PipelineOptions};
use crate::request::{ProcessRequest, ProcessResponse, ValidatedRequest};
use crate::settle::{self, ResultMetadata};

/// External systems the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityVerifier>,
    pub credits: Arc<dyn CreditLedger>,
    pub settings: Arc<dyn SettingsSource>,
    pub results: Arc<dyn ResultStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub enhancer: Arc<dyn EnhancementProvider>,
    pub remover: Arc<dyn BackgroundRemover>,
    pub generator: Arc<dyn BackgroundGenerator>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
}

/// Stateless across invocations; cheap to clone into handlers.
#[derive(Clone)]
pub struct EnhancementPipeline {
    deps: Collaborators,
    options: PipelineOptions,
}

impl EnhancementPipeline {
    pub fn new(deps: Collaborators, options: PipelineOptions) -> Self {
        Self { deps, options }
    }

    /// Run one invocation for the holder of `token`.
    pub async fn run(
        &self,
        token: Option<&str>,
        request: ProcessRequest,
    ) -> Result<ProcessResponse, PipelineError> {
        let started = Instant::now();
        let result = self.execute(token, request, started).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(response) => tracing::info!(
                elapsed_ms,
                stored = response.processed_file_path.is_some(),
                layers = response.foreground_url.is_some(),
                "Image processing finished"
            ),
            Err(e) if is_caller_error(e) => tracing::warn!(
                kind = e.kind(),
                error = %e,
                elapsed_ms,
                "Image processing rejected"
            ),
            Err(e) => tracing::error!(
                kind = e.kind(),
                error = %e,
                diagnostic = e.diagnostic().unwrap_or_default(),
                elapsed_ms,
                "Image processing failed"
            ),
        }
        result
    }

    async fn execute(
        &self,
        token: Option<&str>,
        request: ProcessRequest,
        started: Instant,
    ) -> Result<ProcessResponse, PipelineError> {
        let request = request.validate()?;
        let deps = &self.deps;

        let admission = gate::admit(
            deps.identity.as_ref(),
            deps.credits.as_ref(),
            deps.settings.as_ref(),
            token,
        )
        .await?;
        let user_id = admission.user_id;

        let config = resolve(&admission.snapshot, &request.processing_type, request.background)
            .map_err(|e| match e {
                ResolveError::UnknownCategory(tag) => PipelineError::UnknownCategory(tag),
                ResolveError::MissingPrompt(category) => {
                    PipelineError::MissingPromptConfiguration(category.tag().to_string())
                }
            })?;

        tracing::info!(
            user_id = %user_id,
            processing_type = %config.category,
            background = %config.background,
            settings_version = config.settings_version,
            remaining_credits = admission.remaining_credits,
            "Processing request admitted"
        );

        let source_url = deps
            .storage
            .signed_source_url(&request.image_path, self.options.source_url_ttl)
            .await
            .map_err(|e| PipelineError::SourceUnavailable {
                diagnostic: e.to_string(),
            })?;

        let artifact = match invoke::enhance(
            deps.enhancer.as_ref(),
            self.options.failure_policy,
            &source_url,
            &config,
        )
        .await?
        {
            Enhancement::Enhanced(artifact) => artifact,
            Enhancement::Original { source_url } => {
                return Ok(ProcessResponse {
                    processed_file_path: None,
                    processed_url: source_url,
                    foreground_url: None,
                    background_url: None,
                    enhanced_url: None,
                });
            }
        };
        tracing::debug!(user_id = %user_id, hosted = artifact.url().is_some(), "Enhancement complete");

        let mut layers = match config.scene_prompt.as_deref() {
            Some(scene_prompt) if config.background.replaces_background() => {
                match background::replace_background(
                    deps.remover.as_ref(),
                    deps.generator.as_ref(),
                    &artifact.fetchable_url(),
                    scene_prompt,
                )
                .await
                {
                    Ok(layers) => Some(layers),
                    Err(e) => {
                        tracing::warn!(
                            user_id = %user_id,
                            kind = e.kind(),
                            diagnostic = e.diagnostic().unwrap_or_default(),
                            "Background replacement failed, returning the enhanced image alone"
                        );
                        None
                    }
                }
            }
            None if config.background.replaces_background() => {
                tracing::warn!(
                    user_id = %user_id,
                    background = %config.background,
                    "No scene prompt configured for this background, returning the enhanced image alone"
                );
                None
            }
            _ => None,
        };

        let enhanced_url = artifact.url().map(str::to_string);
        let composite = match (&layers, self.options.composite_mode) {
            (Some(found), CompositeMode::Server) => {
                Some(background::composite(deps.fetcher.as_ref(), found).await)
            }
            _ => None,
        };

        let composited = matches!(composite, Some(Ok(_)));
        let final_artifact = match composite {
            Some(Ok(bytes)) => ArtifactBytes {
                bytes,
                content_type: COMPOSITE_CONTENT_TYPE,
                extension: "png",
            },
            Some(Err(e)) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Server-side compositing failed, returning the enhanced image alone"
                );
                layers = None;
                invoke::load(deps.fetcher.as_ref(), artifact).await?
            }
            None => invoke::load(deps.fetcher.as_ref(), artifact).await?,
        };

        let metadata = ResultMetadata {
            project_id: request.project_id,
            processing_type: config.category.tag().to_string(),
            model_used: deps.enhancer.model_name().to_string(),
            source_image_path: request.image_path.clone(),
            prompt_used: config.prompt.clone(),
            processing_parameters: processing_parameters(
                &config,
                &request,
                self.options.composite_mode,
                composited,
            ),
            processing_time_ms: started.elapsed().as_millis() as i64,
        };

        let stored = settle::settle(
            deps.storage.as_ref(),
            deps.credits.as_ref(),
            deps.results.as_ref(),
            user_id,
            final_artifact,
            metadata,
        )
        .await?;

        let enhanced_url = if composited { enhanced_url } else { None };
        Ok(respond(stored.path, stored.public_url, layers, enhanced_url))
    }
}

fn respond(
    path: String,
    public_url: String,
    layers: Option<Layers>,
    enhanced_url: Option<String>,
) -> ProcessResponse {
    let (foreground_url, background_url) = match layers {
        Some(Layers {
            foreground_url,
            background_url,
        }) => (Some(foreground_url), Some(background_url)),
        None => (None, None),
    };
    ProcessResponse {
        processed_file_path: Some(path),
        processed_url: public_url,
        foreground_url,
        background_url,
        enhanced_url,
    }
}

fn processing_parameters(
    config: &ResolvedConfig,
    request: &ValidatedRequest,
    mode: CompositeMode,
    composited: bool,
) -> serde_json::Value {
    json!({
        "strength": config.strength,
        "guidance_scale": config.guidance_scale,
        "steps": config.steps,
        "negative_prompt": config.negative_prompt,
        "background_option": request.background.tag(),
        "settings_version": config.settings_version,
        "composite_mode": mode.as_str(),
        "composited": composited,
    })
}

fn is_caller_error(err: &PipelineError) -> bool {
    matches!(
        err,
        PipelineError::InvalidRequest(_)
            | PipelineError::Unauthenticated
            | PipelineError::InsufficientCredits
            | PipelineError::MaintenanceMode(_)
            | PipelineError::UnknownCategory(_)
    )
}
