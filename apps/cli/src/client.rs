//! HTTP client for the Babel translation server.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Request timeout; translation of long batches on a cold model can take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Response of `GET /`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsResponse {
    /// Configured artifact names.
    pub models: Vec<String>,
    /// Configured pairs, `src_tgt`.
    pub pairs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SupportedResponse {
    translations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FreeResponse {
    freed: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Thin typed wrapper over the server's HTTP routes.
#[derive(Debug, Clone)]
pub struct BabelClient {
    base_url: String,
    client: reqwest::Client,
}

impl BabelClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), client })
    }

    /// Artifact names and pairs known to the server.
    pub async fn models(&self) -> Result<ModelsResponse> {
        self.send(Method::GET, "/", &[]).await
    }

    /// Supported directions, `a <--> b` / `a --> b`.
    pub async fn supported(&self) -> Result<Vec<String>> {
        let response: SupportedResponse = self.send(Method::GET, "/supported", &[]).await?;
        Ok(response.translations)
    }

    /// Translate `texts` in order.
    pub async fn translate(&self, from: &str, to: &str, texts: &[String]) -> Result<Vec<String>> {
        let mut query = vec![("source_lang", from), ("target_lang", to)];
        query.extend(texts.iter().map(|text| ("data_list", text.as_str())));
        self.send(Method::GET, "/translate_list", &query).await
    }

    /// Back-translate `text` through each of `targets`.
    pub async fn augment(
        &self,
        from: &str,
        targets: &[String],
        text: &str,
    ) -> Result<BTreeMap<String, String>> {
        let mut query = vec![("source_lang", from), ("data", text)];
        query.extend(targets.iter().map(|target| ("target_langs", target.as_str())));
        self.send(Method::GET, "/augment", &query).await
    }

    /// Free the pair's model. Returns whether one was resident.
    pub async fn free(&self, from: &str, to: &str) -> Result<bool> {
        let response: FreeResponse = self
            .send(Method::POST, "/free_model", &[("source_lang", from), ("target_lang", to)])
            .await?;
        Ok(response.freed)
    }

    /// Flush every resident model's cache.
    pub async fn flush(&self) -> Result<bool> {
        self.send(Method::POST, "/empty_cache", &[]).await
    }

    /// Raw server statistics.
    pub async fn stats(&self) -> Result<serde_json::Value> {
        self.send(Method::GET, "/stats", &[]).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!(%method, path, "Sending request");
        let response = self
            .request(method, path)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach Babel server at {}", self.base_url))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await.context("Failed to read response body")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or(body, |error| error.error);
            bail!("Server returned {}: {}", status, message);
        }

        serde_json::from_str(&body).context("Failed to parse server response")
    }
}
