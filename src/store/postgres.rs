use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::AuditStore;
use crate::models::audit::{AuditRecord, NewAuditLog, ReviewStatus, SourceDocument};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const AUDIT_COLUMNS: &str = "id, user_id, prompt, response, sources, confidence_score, \
     policy_flag, status, reviewer_id, reviewed_at, created_at, pinned, custom_title";

#[derive(Debug, sqlx::FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub prompt: String,
    pub response: String,
    pub sources: Option<serde_json::Value>,
    pub confidence_score: Option<f64>,
    pub policy_flag: Option<bool>,
    pub status: String,
    pub reviewer_id: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub pinned: Option<bool>,
    pub custom_title: Option<String>,
}

impl TryFrom<AuditLogRow> for AuditRecord {
    type Error = anyhow::Error;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let sources: Vec<SourceDocument> = match row.sources {
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(v) => serde_json::from_value(v)
                .with_context(|| format!("malformed sources on audit log {}", row.id))?,
        };
        Ok(AuditRecord {
            id: row.id,
            user_id: row.user_id,
            prompt: row.prompt,
            response: row.response,
            sources,
            confidence_score: row.confidence_score.unwrap_or(0.0),
            policy_flag: row.policy_flag.unwrap_or(false),
            status: row.status.parse()?,
            reviewer_id: row.reviewer_id,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            pinned: row.pinned.unwrap_or(false),
            custom_title: row.custom_title,
        })
    }
}

#[async_trait::async_trait]
impl AuditStore for PgStore {
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> anyhow::Result<Uuid> {
        let sources = serde_json::to_value(&entry.sources)?;
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"INSERT INTO audit_logs (id, user_id, prompt, response, sources, confidence_score, policy_flag, status, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
               RETURNING id"#,
        )
        .bind(entry.id)
        .bind(&entry.user_id)
        .bind(&entry.prompt)
        .bind(&entry.response)
        .bind(sources)
        .bind(entry.confidence_score)
        .bind(entry.policy_flag)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("insert_audit_log failed: {:?}", e);
            e
        })?;

        Ok(id)
    }

    async fn get_audit_log(&self, id: Uuid) -> anyhow::Result<Option<AuditRecord>> {
        let row = sqlx::query_as::<_, AuditLogRow>(&format!(
            "SELECT {} FROM audit_logs WHERE id = $1",
            AUDIT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AuditRecord::try_from).transpose()
    }

    async fn record_review(
        &self,
        id: Uuid,
        status: ReviewStatus,
        reviewer_id: &str,
        reviewed_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE audit_logs SET status = $1, reviewer_id = $2, reviewed_at = $3 WHERE id = $4 AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(reviewer_id)
        .bind(reviewed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_pinned(&self, id: Uuid, pinned: bool) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE audit_logs SET pinned = $1 WHERE id = $2")
            .bind(pinned)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_custom_title(&self, id: Uuid, custom_title: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE audit_logs SET custom_title = $1 WHERE id = $2")
            .bind(custom_title)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_audit_log(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_audit_logs(&self, limit: i64) -> anyhow::Result<Vec<AuditRecord>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(&format!(
            "SELECT {} FROM audit_logs ORDER BY pinned DESC, created_at DESC LIMIT $1",
            AUDIT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditRecord::try_from).collect()
    }

    async fn recent_statuses(&self, limit: i64) -> anyhow::Result<Vec<ReviewStatus>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT status FROM audit_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|s| s.parse()).collect()
    }
}
