//! In-process store implementations. Same contracts as the Postgres-backed
//! ones; used by tests and for running without a database.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuditStore, VectorIndex};
use crate::models::audit::{AuditRecord, NewAuditLog, ReviewStatus};
use crate::models::document::{Document, ScoredDocument};

/// Shared, cheaply-cloneable audit log table.
#[derive(Clone, Default)]
pub struct MemoryAuditStore(Arc<RwLock<Vec<AuditRecord>>>);

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, bypassing the pending-only insert path.
    /// Lets tests set up reviewed or pinned history directly.
    pub async fn insert_record(&self, record: AuditRecord) {
        self.0.write().await.push(record);
    }

    async fn update<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut AuditRecord) -> bool,
    {
        let mut records = self.0.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => f(record),
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> anyhow::Result<Uuid> {
        let mut records = self.0.write().await;
        if records.iter().any(|r| r.id == entry.id) {
            anyhow::bail!("duplicate audit log id {}", entry.id);
        }
        records.push(entry.clone().into_record());
        Ok(entry.id)
    }

    async fn get_audit_log(&self, id: Uuid) -> anyhow::Result<Option<AuditRecord>> {
        Ok(self.0.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn record_review(
        &self,
        id: Uuid,
        status: ReviewStatus,
        reviewer_id: &str,
        reviewed_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        Ok(self
            .update(id, |r| {
                if r.status != ReviewStatus::Pending {
                    return false;
                }
                r.status = status;
                r.reviewer_id = Some(reviewer_id.to_string());
                r.reviewed_at = Some(reviewed_at);
                true
            })
            .await)
    }

    async fn set_pinned(&self, id: Uuid, pinned: bool) -> anyhow::Result<bool> {
        Ok(self
            .update(id, |r| {
                r.pinned = pinned;
                true
            })
            .await)
    }

    async fn set_custom_title(&self, id: Uuid, custom_title: &str) -> anyhow::Result<bool> {
        Ok(self
            .update(id, |r| {
                r.custom_title = Some(custom_title.to_string());
                true
            })
            .await)
    }

    async fn delete_audit_log(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut records = self.0.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn list_audit_logs(&self, limit: i64) -> anyhow::Result<Vec<AuditRecord>> {
        let mut records = self.0.read().await.clone();
        records.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        records.truncate(limit.max(0) as usize);
        Ok(records)
    }

    async fn recent_statuses(&self, limit: i64) -> anyhow::Result<Vec<ReviewStatus>> {
        let mut records = self.0.read().await.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|r| r.status)
            .collect())
    }
}

/// Brute-force Euclidean index.
#[derive(Clone, Default)]
pub struct MemoryVectorIndex(Arc<RwLock<Vec<(Document, Vec<f32>)>>>);

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (*x as f64) - (*y as f64);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[async_trait::async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> anyhow::Result<Vec<ScoredDocument>> {
        let entries = self.0.read().await;
        let mut scored: Vec<ScoredDocument> = entries
            .iter()
            .map(|(doc, embedding)| {
                if embedding.len() != query.len() {
                    anyhow::bail!(
                        "dimension mismatch: query has {}, stored vector has {}",
                        query.len(),
                        embedding.len()
                    );
                }
                Ok(ScoredDocument {
                    document: doc.clone(),
                    distance: euclidean(query, embedding),
                })
            })
            .collect::<anyhow::Result<_>>()?;
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);
        Ok(scored)
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
        let mut entries = self.0.write().await;
        entries.extend(documents.iter().cloned().zip(embeddings));
        Ok(documents.len())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.0.read().await.len() as i64)
    }
}
