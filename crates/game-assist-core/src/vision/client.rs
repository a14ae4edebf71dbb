//! HTTP client for the vision APIs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::provider::ProviderConfig;
use crate::codec::EncodedImage;
use crate::error::{Error, Result};

/// Anything that can turn an image and prompt into a suggestion.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyze one image.
    ///
    /// `Ok(None)` means the provider answered without usable text.
    async fn analyze(
        &self,
        provider: &ProviderConfig,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<Option<String>>;
}

/// reqwest-backed [`VisionAnalyzer`].
///
/// Holds no per-provider state. Authorization headers are built for every
/// request from the provider snapshot passed in.
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    timeout: Duration,
}

impl VisionClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl VisionAnalyzer for VisionClient {
    async fn analyze(
        &self,
        provider: &ProviderConfig,
        image: &EncodedImage,
        prompt: &str,
    ) -> Result<Option<String>> {
        let headers = provider.headers(chrono::Utc::now().timestamp())?;
        let body = provider.kind.build_request(provider, image, prompt);

        tracing::debug!(
            "POST {} ({}, {} image bytes)",
            provider.endpoint,
            provider.model,
            image.len()
        );

        let response = self
            .client
            .post(&provider.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Transport(format!("Request timed out after {:?}", self.timeout))
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!("{} returned {}", provider.kind, status);
            return Err(Error::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        provider.kind.parse_response(&text)
    }
}
