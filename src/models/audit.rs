use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A retrieved chunk used as generation context and as a citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Similarity to the prompt in (0, 1], rounded to 4 decimals.
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => anyhow::bail!("unknown review status: {}", other),
        }
    }
}

/// The only two outcomes a reviewer may choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ReviewStatus {
    fn from(d: ReviewDecision) -> Self {
        match d {
            ReviewDecision::Approved => ReviewStatus::Approved,
            ReviewDecision::Rejected => ReviewStatus::Rejected,
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ReviewStatus::from(*self).fmt(f)
    }
}

/// One prompt/response interaction plus its governance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub prompt: String,
    pub response: String,
    pub sources: Vec<SourceDocument>,
    pub confidence_score: f64,
    pub policy_flag: bool,
    pub status: ReviewStatus,
    pub reviewer_id: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub pinned: bool,
    pub custom_title: Option<String>,
}

/// Insert payload. Status, reviewer fields and `pinned` are never supplied by
/// callers; a new record is always pending and unpinned.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub prompt: String,
    pub response: String,
    pub sources: Vec<SourceDocument>,
    pub confidence_score: f64,
    pub policy_flag: bool,
    pub created_at: DateTime<Utc>,
}

impl NewAuditLog {
    pub fn into_record(self) -> AuditRecord {
        AuditRecord {
            id: self.id,
            user_id: self.user_id,
            prompt: self.prompt,
            response: self.response,
            sources: self.sources,
            confidence_score: self.confidence_score,
            policy_flag: self.policy_flag,
            status: ReviewStatus::Pending,
            reviewer_id: None,
            reviewed_at: None,
            created_at: self.created_at,
            pinned: false,
            custom_title: None,
        }
    }
}
