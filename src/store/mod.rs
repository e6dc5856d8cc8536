//! Persistence seams. `postgres` and `vector` back the running service;
//! `memory` provides in-process implementations for tests and local runs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::audit::{AuditRecord, NewAuditLog, ReviewStatus};
use crate::models::document::{Document, ScoredDocument};

pub mod memory;
pub mod postgres;
pub mod vector;

#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> anyhow::Result<Uuid>;

    async fn get_audit_log(&self, id: Uuid) -> anyhow::Result<Option<AuditRecord>>;

    /// Set status, reviewer and review time, only while the record is still
    /// pending. Returns false when no row was updated.
    async fn record_review(
        &self,
        id: Uuid,
        status: ReviewStatus,
        reviewer_id: &str,
        reviewed_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    async fn set_pinned(&self, id: Uuid, pinned: bool) -> anyhow::Result<bool>;

    async fn set_custom_title(&self, id: Uuid, custom_title: &str) -> anyhow::Result<bool>;

    async fn delete_audit_log(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Pinned first, then newest first.
    async fn list_audit_logs(&self, limit: i64) -> anyhow::Result<Vec<AuditRecord>>;

    /// Statuses of the `limit` most recently created records.
    async fn recent_statuses(&self, limit: i64) -> anyhow::Result<Vec<ReviewStatus>>;
}

#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `k` nearest neighbours of `query`, closest first.
    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> anyhow::Result<Vec<ScoredDocument>>;

    async fn add_documents(
        &self,
        documents: &[Document],
        embeddings: Vec<Vec<f32>>,
    ) -> anyhow::Result<usize>;

    async fn count(&self) -> anyhow::Result<i64>;
}
