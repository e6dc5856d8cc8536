//! Loading documents into the vector index.

use anyhow::Context;
use serde_json::json;

use crate::models::document::Document;
use crate::providers::Embedder;
use crate::store::VectorIndex;

/// The built-in starter corpus.
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "Machine learning is a subset of artificial intelligence that enables systems to learn and improve from experience without being explicitly programmed.",
            json!({"source": "ml_basics.pdf", "page": 1, "topic": "machine_learning"}),
        ),
        Document::new(
            "Deep learning uses neural networks with multiple layers to progressively extract higher-level features from raw input data.",
            json!({"source": "ml_basics.pdf", "page": 2, "topic": "deep_learning"}),
        ),
        Document::new(
            "Natural Language Processing (NLP) is a branch of AI that helps computers understand, interpret and manipulate human language.",
            json!({"source": "nlp_guide.pdf", "page": 1, "topic": "nlp"}),
        ),
        Document::new(
            "Retrieval-Augmented Generation (RAG) combines retrieval of relevant documents with generative AI to produce more accurate and grounded responses.",
            json!({"source": "rag_overview.pdf", "page": 1, "topic": "rag"}),
        ),
        Document::new(
            "Responsible AI focuses on developing AI systems that are fair, transparent, accountable, and respect privacy and human rights.",
            json!({"source": "responsible_ai.pdf", "page": 1, "topic": "responsible_ai"}),
        ),
    ]
}

/// Embed and store `documents`. Returns how many were added.
pub async fn ingest(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    documents: &[Document],
) -> anyhow::Result<usize> {
    if documents.is_empty() {
        return Ok(0);
    }
    let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
    let embeddings = embedder
        .embed_batch(&texts)
        .await
        .context("embedding documents failed")?;
    let added = index.add_documents(documents, embeddings).await?;
    tracing::info!(added, model = embedder.model_name(), "documents ingested");
    Ok(added)
}

/// Ingest the sample corpus when the index holds no documents yet.
pub async fn seed_if_empty(embedder: &dyn Embedder, index: &dyn VectorIndex) -> anyhow::Result<usize> {
    let existing = index.count().await?;
    if existing > 0 {
        tracing::debug!(existing, "vector index already populated, skipping seed");
        return Ok(0);
    }
    ingest(embedder, index, &sample_documents()).await
}
