//! Audit trail and the human review workflow.
//!
//! Records are created `pending` and move exactly once to `approved` or
//! `rejected`. Pinning, renaming and deletion are administrative and do not
//! touch the review state.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analytics::AnalyticsStats;
use crate::models::audit::{AuditRecord, NewAuditLog, ReviewDecision, SourceDocument};
use crate::store::AuditStore;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

pub struct AuditService {
    store: Arc<dyn AuditStore>,
    analytics_window: i64,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>, analytics_window: i64) -> Self {
        Self {
            store,
            analytics_window: analytics_window.max(1),
        }
    }

    /// Persist a new pending record and return its id.
    pub async fn create(
        &self,
        user_id: Option<String>,
        prompt: &str,
        response: &str,
        sources: Vec<SourceDocument>,
        confidence_score: f64,
        policy_flag: bool,
    ) -> Result<Uuid, AppError> {
        let entry = NewAuditLog {
            id: Uuid::new_v4(),
            user_id,
            prompt: prompt.to_string(),
            response: response.to_string(),
            sources,
            confidence_score,
            policy_flag,
            created_at: Utc::now(),
        };
        let id = self.store.insert_audit_log(&entry).await?;
        tracing::info!(audit_id = %id, policy_flag, "audit log created");
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<AuditRecord, AppError> {
        self.store
            .get_audit_log(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Apply a reviewer's decision to a pending record.
    pub async fn review(
        &self,
        id: Uuid,
        decision: ReviewDecision,
        reviewer_id: &str,
    ) -> Result<AuditRecord, AppError> {
        let current = self.get(id).await?;
        if current.status.is_terminal() {
            return Err(AppError::InvalidState(current.status.to_string()));
        }

        let updated = self
            .store
            .record_review(id, decision.into(), reviewer_id, Utc::now())
            .await?;

        // The row changed between the read and the conditional update.
        if !updated {
            let latest = self.get(id).await?;
            return Err(AppError::InvalidState(latest.status.to_string()));
        }

        tracing::info!(audit_id = %id, %decision, reviewer_id, "audit log reviewed");
        self.get(id).await
    }

    pub async fn pin(&self, id: Uuid, pinned: bool) -> Result<(), AppError> {
        if !self.store.set_pinned(id, pinned).await? {
            return Err(AppError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn rename(&self, id: Uuid, custom_title: &str) -> Result<(), AppError> {
        if !self.store.set_custom_title(id, custom_title).await? {
            return Err(AppError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_audit_log(id).await? {
            return Err(AppError::NotFound(id.to_string()));
        }
        tracing::warn!(audit_id = %id, "audit log deleted");
        Ok(())
    }

    /// Pinned records first, then newest first.
    pub async fn list(&self, limit: Option<i64>) -> Result<Vec<AuditRecord>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_LIST_LIMIT
            )));
        }
        Ok(self.store.list_audit_logs(limit).await?)
    }

    /// Review statistics over the most recent records. Never fails: store
    /// errors are logged and reported as an all-zero result.
    pub async fn analytics(&self) -> AnalyticsStats {
        match self.store.recent_statuses(self.analytics_window).await {
            Ok(statuses) => AnalyticsStats::from_statuses(&statuses),
            Err(e) => {
                tracing::error!("analytics query failed: {:#}", e);
                AnalyticsStats::zero()
            }
        }
    }
}
