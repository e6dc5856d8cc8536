use std::sync::Arc;

use axum::{
    extract::{FromRequest, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::audit::{AuditRecord, ReviewDecision, ReviewStatus, SourceDocument};
use crate::AppState;

// ── Extractors ───────────────────────────────────────────────

/// `Json` whose rejections render as our 422 error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path ids that are not UUIDs cannot name an existing record.
fn parse_audit_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(raw.to_string()))
}

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
    pub user_id: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub audit_id: Uuid,
    pub answer: String,
    pub sources: Vec<SourceDocument>,
    pub confidence_score: f64,
    pub policy_flag: bool,
    pub policy_violations: Vec<String>,
    pub status: ReviewStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    pub reviewer_id: String,
    pub comments: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub message: &'static str,
    pub audit_id: Uuid,
    pub decision: ReviewDecision,
    pub reviewer_id: String,
    pub audit_log: AuditRecord,
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pinned: bool,
}

#[derive(Debug, Serialize)]
pub struct PinResponse {
    pub message: &'static str,
    pub audit_id: Uuid,
    pub pinned: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub custom_title: String,
}

#[derive(Debug, Serialize)]
pub struct RenameResponse {
    pub message: &'static str,
    pub audit_id: Uuid,
    pub custom_title: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub audit_id: Uuid,
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /: service banner
pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "name": state.config.app_name,
        "version": state.config.app_version,
        "status": "running",
        "features": [
            "RAG Pipeline",
            "Policy Enforcement",
            "Human-in-the-Loop Review",
            "Audit Logging"
        ],
        "confidence_threshold": state.config.confidence_threshold,
        "similarity_threshold": state.config.similarity_threshold,
    }))
}

/// GET /health: liveness
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": state.config.app_version,
    }))
}

/// POST /prompt: answer from retrieved context, screen, and record for review
pub async fn submit_prompt(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<PromptRequest>,
) -> Result<Json<PromptResponse>, AppError> {
    if payload.prompt.is_empty() {
        return Err(AppError::Validation("prompt must not be empty".into()));
    }

    let rag = state
        .rag
        .generate_response(&payload.prompt, payload.language.as_deref())
        .await?;

    let verdict = state
        .screener
        .check_prompt_and_response(&payload.prompt, &rag.answer);

    let audit_id = state
        .audit
        .create(
            payload.user_id,
            &payload.prompt,
            &rag.answer,
            rag.sources.clone(),
            rag.confidence_score,
            verdict.violation,
        )
        .await?;

    Ok(Json(PromptResponse {
        audit_id,
        answer: rag.answer,
        sources: rag.sources,
        confidence_score: rag.confidence_score,
        policy_flag: verdict.violation,
        policy_violations: verdict.violations,
        status: ReviewStatus::Pending,
    }))
}

/// GET /audit: pinned first, then newest first
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    Ok(Json(state.audit.list(params.limit).await?))
}

/// GET /audit/:id
pub async fn get_audit_log(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<AuditRecord>, AppError> {
    let id = parse_audit_id(&id_str)?;
    Ok(Json(state.audit.get(id).await?))
}

/// PATCH /audit/:id/pin
pub async fn pin_audit_log(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    ApiJson(payload): ApiJson<PinRequest>,
) -> Result<Json<PinResponse>, AppError> {
    let id = parse_audit_id(&id_str)?;
    state.audit.pin(id, payload.pinned).await?;

    Ok(Json(PinResponse {
        message: "Pin status updated successfully",
        audit_id: id,
        pinned: payload.pinned,
    }))
}

/// PATCH /audit/:id/rename
pub async fn rename_audit_log(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    ApiJson(payload): ApiJson<RenameRequest>,
) -> Result<Json<RenameResponse>, AppError> {
    let id = parse_audit_id(&id_str)?;
    if payload.custom_title.is_empty() {
        return Err(AppError::Validation("custom_title must not be empty".into()));
    }
    state.audit.rename(id, &payload.custom_title).await?;

    Ok(Json(RenameResponse {
        message: "Audit log renamed successfully",
        audit_id: id,
        custom_title: payload.custom_title,
    }))
}

/// DELETE /audit/:id: admin only when ADMIN_KEY is set
pub async fn delete_audit_log(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_audit_id(&id_str)?;
    state.audit.delete(id).await?;

    Ok(Json(DeleteResponse {
        message: "Audit log deleted successfully",
        audit_id: id,
    }))
}

/// POST /review/:id: approve or reject a pending answer
pub async fn review_audit_log(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    ApiJson(payload): ApiJson<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let id = parse_audit_id(&id_str)?;
    if payload.reviewer_id.trim().is_empty() {
        return Err(AppError::Validation("reviewer_id must not be empty".into()));
    }
    if let Some(comments) = payload.comments.as_deref().filter(|c| !c.is_empty()) {
        tracing::info!(audit_id = %id, reviewer_id = %payload.reviewer_id, comments, "review comments");
    }

    let record = state
        .audit
        .review(id, payload.decision, &payload.reviewer_id)
        .await?;

    Ok(Json(ReviewResponse {
        message: "Review submitted successfully",
        audit_id: id,
        decision: payload.decision,
        reviewer_id: payload.reviewer_id,
        audit_log: record,
    }))
}
