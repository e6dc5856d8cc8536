//! pgvector-backed document index. Distances are Euclidean (`<->`).

use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use super::VectorIndex;
use crate::models::document::{Document, ScoredDocument};

#[derive(Clone)]
pub struct PgVectorIndex {
    pool: PgPool,
}

impl PgVectorIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NeighbourRow {
    content: String,
    metadata: Option<serde_json::Value>,
    distance: f64,
}

#[async_trait::async_trait]
impl VectorIndex for PgVectorIndex {
    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> anyhow::Result<Vec<ScoredDocument>> {
        let rows = sqlx::query_as::<_, NeighbourRow>(
            r#"SELECT content, metadata, (embedding <-> $1)::float8 AS distance
               FROM documents
               ORDER BY embedding <-> $1
               LIMIT $2"#,
        )
        .bind(Vector::from(query.to_vec()))
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ScoredDocument {
                document: Document::new(r.content, r.metadata.unwrap_or_default()),
                distance: r.distance,
            })
            .collect())
    }

    async fn add_documents(
        &self,
        documents: &[Document],
        embeddings: Vec<Vec<f32>>,
    ) -> anyhow::Result<usize> {
        if documents.len() != embeddings.len() {
            anyhow::bail!(
                "got {} embeddings for {} documents",
                embeddings.len(),
                documents.len()
            );
        }

        let mut tx = self.pool.begin().await?;
        for (doc, embedding) in documents.iter().zip(embeddings) {
            sqlx::query(
                "INSERT INTO documents (id, content, metadata, embedding) VALUES ($1, $2, $3, $4)",
            )
            .bind(Uuid::new_v4())
            .bind(&doc.content)
            .bind(serde_json::Value::Object(doc.metadata.clone()))
            .bind(Vector::from(embedding))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(documents.len())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
