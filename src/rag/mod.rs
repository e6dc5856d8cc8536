//! Retrieval-augmented answering: embed, retrieve, score, generate.

use std::sync::Arc;

use serde::Serialize;

use crate::errors::AppError;
use crate::models::audit::SourceDocument;
use crate::providers::{Embedder, Generator};
use crate::store::VectorIndex;

pub mod confidence;
pub mod ingest;
pub mod prompts;

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<SourceDocument>,
    pub confidence_score: f64,
}

pub struct RagService {
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    default_language: String,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            generator,
            index,
            top_k: top_k.max(1),
            default_language: default_language.into(),
        }
    }

    /// Answer `prompt` from the indexed documents.
    ///
    /// Makes one embedding call, one retrieval call and at most one generation
    /// call. When nothing is retrieved the language's fixed fallback reply is
    /// returned with confidence 0.0 and the generator is not called.
    pub async fn generate_response(
        &self,
        prompt: &str,
        language: Option<&str>,
    ) -> Result<RagAnswer, AppError> {
        let pack = prompts::resolve(language, &self.default_language);

        let query = self.embedder.embed(prompt).await?;
        let neighbours = self.index.similarity_search(&query, self.top_k).await?;

        if neighbours.is_empty() {
            tracing::info!(language = pack.code, "no documents retrieved");
            return Ok(RagAnswer {
                answer: prompts::insufficient_information(language, &self.default_language)
                    .to_string(),
                sources: Vec::new(),
                confidence_score: 0.0,
            });
        }

        let similarities: Vec<f64> = neighbours
            .iter()
            .map(|n| confidence::distance_to_similarity(n.distance))
            .collect();
        let confidence_score = confidence::calculate_confidence(&similarities);

        let context = neighbours
            .iter()
            .map(|n| n.document.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let answer = self.generator.generate(&pack.render(&context, prompt)).await?;

        let sources = neighbours
            .into_iter()
            .zip(similarities)
            .map(|(n, s)| SourceDocument {
                content: n.document.content,
                metadata: n.document.metadata,
                similarity_score: confidence::round_to(s, 4),
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            retrieved = sources.len(),
            confidence_score,
            language = pack.code,
            model = self.generator.model_name(),
            "generated answer"
        );

        Ok(RagAnswer {
            answer,
            sources,
            confidence_score,
        })
    }
}
