//! Downloads of provider-hosted artifacts.

use std::time::Duration;

use async_trait::async_trait;
use fotoai_core::artifact::ProviderError;
use fotoai_core::ports::ArtifactFetcher;

use crate::envelope::{self, truncate};

/// Plain HTTP GET fetcher. `data:` URIs are decoded without a request.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        if let Some(decoded) = envelope::decode_data_uri(url) {
            return decoded.map(|(bytes, _)| bytes);
        }

        let response = self.client.get(url).send().await.map_err(|e| ProviderError::Call {
            status: e.status().map(|s| s.as_u16()),
            diagnostic: format!("downloading artifact: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Call {
                status: Some(status.as_u16()),
                diagnostic: truncate(&body),
            });
        }

        let bytes = response.bytes().await.map_err(|e| ProviderError::Call {
            status: Some(status.as_u16()),
            diagnostic: format!("reading artifact body: {e}"),
        })?;
        Ok(bytes.to_vec())
    }
}
