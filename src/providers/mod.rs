//! Model providers: text → vector and text → text.

use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;

pub mod gemini;
pub mod hashing;

#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    fn model_name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    /// One completion for a fully rendered prompt. The raw model output is
    /// returned unchanged.
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// Build the embedder selected by `EMBEDDING_PROVIDER`.
pub fn create_embedder(cfg: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    match cfg.embedding_provider.as_str() {
        "hashing" => Ok(Arc::new(hashing::HashingEmbedder::new(
            cfg.embedding_dimensions,
        ))),
        "gemini" => Ok(Arc::new(gemini::GeminiClient::from_config(cfg)?)),
        other => anyhow::bail!("unknown embedding provider: '{}'", other),
    }
}
