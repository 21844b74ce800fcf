//! fal.ai-style provider client.
//!
//! Every endpoint is called synchronously (`https://fal.run/...`): the request
//! blocks until the model finishes or the client timeout fires, so there is
//! no queue polling here.

use std::time::Duration;

use async_trait::async_trait;
use fotoai_core::artifact::{ArtifactRef, ProviderError};
use fotoai_core::ports::{BackgroundGenerator, BackgroundRemover, EnhancementProvider};
use fotoai_core::resolve::ResolvedConfig;
use serde::Serialize;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::envelope::{self, truncate};

/// HTTP client for the enhancement, rembg and background endpoints.
#[derive(Clone)]
pub struct FalClient {
    client: reqwest::Client,
    api_key: String,
    enhance_endpoint: String,
    rembg_endpoint: String,
    background_endpoint: String,
    model_name: String,
}

/// Body of an enhancement request.
#[derive(Debug, Serialize)]
struct EnhanceRequest<'a> {
    prompt: &'a str,
    image_url: &'a str,
    image_prompt_strength: f64,
    guidance_scale: f64,
    num_inference_steps: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
}

impl FalClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling, tests).
    pub fn with_client(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            enhance_endpoint: config.enhance_endpoint.clone(),
            rembg_endpoint: config.rembg_endpoint.clone(),
            background_endpoint: config.background_endpoint.clone(),
            model_name: config.model_name.clone(),
        }
    }

    /// POST `payload` to `endpoint` and return the parsed success body.
    ///
    /// Non-2xx statuses, transport failures, bodies that are not JSON and
    /// bodies carrying an `error` field are all [`ProviderError::Call`].
    async fn submit<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("Key {}", self.api_key))
            .json(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let parsed = serde_json::from_str::<Value>(&text);

        if !status.is_success() {
            return Err(ProviderError::Call {
                status: Some(status.as_u16()),
                diagnostic: truncate(&text),
            });
        }

        let body = parsed.map_err(|_| ProviderError::Call {
            status: Some(status.as_u16()),
            diagnostic: format!("response was not valid JSON: {}", truncate(&text)),
        })?;

        if let Some(reported) = envelope::reported_error(&body) {
            return Err(ProviderError::Call {
                status: Some(status.as_u16()),
                diagnostic: truncate(&reported.to_string()),
            });
        }

        Ok(body)
    }

    /// Submit and pull out the artifact URL as a string (data URIs included).
    async fn submit_for_url<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<String, ProviderError> {
        let body = self.submit(endpoint, payload).await?;
        envelope::extract_url(&body)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse {
                diagnostic: truncate(&body.to_string()),
            })
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    let diagnostic = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    ProviderError::Call {
        status: err.status().map(|s| s.as_u16()),
        diagnostic,
    }
}

#[async_trait]
impl EnhancementProvider for FalClient {
    async fn enhance(
        &self,
        image_url: &str,
        config: &ResolvedConfig,
    ) -> Result<ArtifactRef, ProviderError> {
        let request = EnhanceRequest {
            prompt: &config.prompt,
            image_url,
            image_prompt_strength: config.strength,
            guidance_scale: config.guidance_scale,
            num_inference_steps: config.steps,
            negative_prompt: config.negative_prompt.as_deref(),
        };
        tracing::debug!(
            endpoint = %self.enhance_endpoint,
            category = %config.category,
            strength = config.strength,
            steps = config.steps,
            "Submitting enhancement request"
        );

        let body = self.submit(&self.enhance_endpoint, &request).await?;
        envelope::extract_artifact(&body)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl BackgroundRemover for FalClient {
    async fn remove_background(&self, image_url: &str) -> Result<String, ProviderError> {
        tracing::debug!(endpoint = %self.rembg_endpoint, "Submitting background removal request");
        self.submit_for_url(
            &self.rembg_endpoint,
            &serde_json::json!({ "image_url": image_url }),
        )
        .await
    }
}

#[async_trait]
impl BackgroundGenerator for FalClient {
    async fn generate_background(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(endpoint = %self.background_endpoint, "Submitting background generation request");
        self.submit_for_url(&self.background_endpoint, &serde_json::json!({ "prompt": prompt }))
            .await
    }
}
