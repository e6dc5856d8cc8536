//! HTTP client for the Google Gemini REST API (embeddings + generation).
//! One request per call; failures surface as `AppError::Upstream`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Embedder, Generator};
use crate::config::Config;
use crate::errors::AppError;

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    generation_model: String,
    embedding_model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        generation_model: impl Into<String>,
        embedding_model: impl Into<String>,
        temperature: f32,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(16)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            generation_model: generation_model.into(),
            embedding_model: embedding_model.into(),
            temperature,
        })
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Self::new(
            &cfg.gemini_base_url,
            cfg.gemini_api_key()?,
            &cfg.gemini_model,
            &cfg.embedding_model,
            cfg.gemini_temperature,
        )
    }

    fn url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Gemini request failed: {}", e);
                AppError::Upstream(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Gemini returned an error");
            return Err(AppError::Upstream(format!(
                "gemini returned status={}, body={}",
                status, body
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid gemini response: {}", e)))
    }
}

// ── Wire types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait::async_trait]
impl Embedder for GeminiClient {
    fn model_name(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let model = self.embedding_model.trim_start_matches("models/");
        let body = json!({
            "model": format!("models/{}", model),
            "content": { "parts": [{ "text": text }] },
        });
        let resp: EmbedContentResponse = self
            .post(&self.url(model, "embedContent"), &body)
            .await?;
        if resp.embedding.values.is_empty() {
            return Err(AppError::Upstream("gemini returned an empty embedding".into()));
        }
        Ok(resp.embedding.values)
    }
}

#[async_trait::async_trait]
impl Generator for GeminiClient {
    fn model_name(&self) -> &str {
        &self.generation_model
    }

    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": self.temperature },
        });
        let resp: GenerateContentResponse = self
            .post(&self.url(&self.generation_model, "generateContent"), &body)
            .await?;

        let content = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| AppError::Upstream("gemini returned no candidates".into()))?;

        Ok(content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}
