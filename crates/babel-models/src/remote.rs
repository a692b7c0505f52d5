//! Engine backed by a remote inference server.
//!
//! The server hosts the trained artifacts and exposes one batched endpoint:
//!
//! ```text
//! POST {base_url}/generate
//! {"model": "opus-mt-he-ar", "device": "cuda:0", "inputs": [">>ara<< shalom"]}
//!
//! 200 OK
//! {"outputs": ["مرحبا"]}
//! ```
//!
//! Device placement is forwarded with every request; the server owns the weights.

use std::time::Duration;

use async_trait::async_trait;
use babel_abstraction::{Device, EngineError, LanguagePair, TranslationEngine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::catalog::ModelArtifact;
use crate::preprocess::prepare_input;

/// Generation can take a while for long batches on CPU.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    device: String,
    inputs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    outputs: Vec<String>,
}

/// Translation engine forwarding batches to an inference server over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteEngine {
    pair: LanguagePair,
    artifact: ModelArtifact,
    base_url: String,
    device: Device,
    client: Client,
}

impl RemoteEngine {
    /// Creates an engine for `pair` serving `artifact` from `base_url`.
    ///
    /// # Errors
    /// Returns `EngineError::Generation` if the HTTP client cannot be built.
    pub fn new(
        pair: LanguagePair,
        artifact: ModelArtifact,
        base_url: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| {
            EngineError::Generation(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            pair,
            artifact,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            device: Device::Cpu,
            client,
        })
    }

    /// The artifact this engine serves.
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }
}

#[async_trait]
impl TranslationEngine for RemoteEngine {
    fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    fn preprocess(&self, text: &str) -> String {
        prepare_input(self.artifact.special_token.as_deref(), text)
    }

    async fn generate(&self, batch: &[String]) -> Result<Vec<String>, EngineError> {
        let url = format!("{}/generate", self.base_url);
        debug!(
            pair = %self.pair,
            model = %self.artifact.model_name,
            batch_size = batch.len(),
            "Sending batch to inference server"
        );

        let request = GenerateRequest {
            model: &self.artifact.model_name,
            device: self.device.to_string(),
            inputs: batch,
        };

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!(error = %e, url = %url, "Inference request failed");
            EngineError::Generation(format!("Request to {url} failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Inference server returned an error");
            return Err(EngineError::Generation(format!("Inference server returned {status}: {body}")));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            EngineError::Generation(format!("Invalid inference server response: {e}"))
        })?;
        Ok(parsed.outputs)
    }

    fn device(&self) -> Device {
        self.device
    }

    fn to_device(&mut self, device: Device) -> Result<(), EngineError> {
        self.device = device;
        Ok(())
    }
}
