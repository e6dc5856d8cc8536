//! End-to-end tests over the HTTP router.
//!
//! Every collaborator is in-process: the audit trail and vector index live in
//! memory, embeddings come from the deterministic hashing embedder, and the
//! generator returns a canned answer. No database or network is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use govrag::audit::AuditService;
use govrag::config::Config;
use govrag::errors::AppError;
use govrag::middleware::policy::PolicyScreener;
use govrag::providers::hashing::HashingEmbedder;
use govrag::providers::Generator;
use govrag::rag::{ingest, RagService};
use govrag::store::memory::{MemoryAuditStore, MemoryVectorIndex};
use govrag::AppState;

// ── Harness ──────────────────────────────────────────────────

struct CannedGenerator(&'static str);

#[async_trait::async_trait]
impl Generator for CannedGenerator {
    fn model_name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, AppError> {
        Ok(self.0.to_string())
    }
}

const CANNED_ANSWER: &str =
    "Machine learning lets systems learn from experience without explicit programming.";

async fn app_with(config: Config, answer: &'static str, seed: bool) -> Router {
    let embedder = Arc::new(HashingEmbedder::new(256));
    let index = Arc::new(MemoryVectorIndex::new());
    if seed {
        ingest::seed_if_empty(&*embedder, &*index)
            .await
            .unwrap();
    }

    let screener = PolicyScreener::from_config(&config).unwrap();
    let rag = RagService::new(
        embedder,
        Arc::new(CannedGenerator(answer)),
        index,
        config.retrieval_top_k,
        config.default_language.clone(),
    );
    let audit = AuditService::new(Arc::new(MemoryAuditStore::new()), config.analytics_window);

    govrag::api::router(Arc::new(AppState {
        config,
        rag,
        screener,
        audit,
    }))
}

async fn app() -> Router {
    app_with(Config::default(), CANNED_ANSWER, true).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn submit(app: &Router, prompt: &str) -> Value {
    let (status, body) = send(app, json_request("POST", "/prompt", json!({ "prompt": prompt }))).await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    body
}

mod prompt_tests {
    use super::*;

    #[tokio::test]
    async fn test_machine_learning_end_to_end() {
        let app = app().await;
        let body = submit(&app, "What is machine learning?").await;

        assert_eq!(body["answer"], CANNED_ANSWER);
        assert_eq!(body["status"], "pending");
        assert_eq!(body["policy_flag"], false);
        assert!(body["confidence_score"].as_f64().unwrap() > 0.0);

        let sources = body["sources"].as_array().unwrap();
        assert!(!sources.is_empty());
        assert!(sources
            .iter()
            .any(|s| s["metadata"]["source"] == "ml_basics.pdf"));
        for s in sources {
            let score = s["similarity_score"].as_f64().unwrap();
            assert!(score > 0.0 && score <= 1.0);
        }

        let id = body["audit_id"].as_str().unwrap();
        let (status, record) = send(&app, get(&format!("/audit/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["prompt"], "What is machine learning?");
        assert_eq!(record["status"], "pending");
        assert_eq!(record["pinned"], false);
        assert!(record["reviewer_id"].is_null());
    }

    #[tokio::test]
    async fn test_flagged_prompt_is_still_pending() {
        let app = app().await;
        let body = submit(&app, "My SSN is 123-45-6789, should I file a lawsuit?").await;

        assert_eq!(body["policy_flag"], true);
        assert_eq!(body["status"], "pending");
        let labels: Vec<&str> = body["policy_violations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(labels.contains(&"prompt:pii_ssn"));
        assert!(labels.contains(&"prompt:sensitive_legal:lawsuit"));
    }

    #[tokio::test]
    async fn test_flagged_response_sets_policy_flag() {
        let app = app_with(
            Config::default(),
            "Please seek medical advice before changing your prescription.",
            true,
        )
        .await;
        let body = submit(&app, "What is deep learning?").await;
        assert_eq!(body["policy_flag"], true);
        let labels = body["policy_violations"].as_array().unwrap();
        assert!(labels
            .iter()
            .all(|l| l.as_str().unwrap().starts_with("response:")));
        assert!(labels.iter().any(|l| l == "response:sensitive_medical:prescription"));
    }

    #[tokio::test]
    async fn test_policy_check_can_be_disabled() {
        let config = Config {
            enable_policy_check: false,
            ..Default::default()
        };
        let app = app_with(config, CANNED_ANSWER, true).await;
        let body = submit(&app, "SSN 123-45-6789").await;
        assert_eq!(body["policy_flag"], false);
        assert!(body["policy_violations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_index_returns_fallback_message() {
        let app = app_with(Config::default(), CANNED_ANSWER, false).await;
        let body = submit(&app, "What is machine learning?").await;
        assert_eq!(
            body["answer"],
            "Maaf, saya tidak memiliki cukup informasi untuk menjawab pertanyaan ini."
        );
        assert_eq!(body["confidence_score"], 0.0);
        assert!(body["sources"].as_array().unwrap().is_empty());

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/prompt",
                json!({ "prompt": "What is machine learning?", "language": "en" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["answer"],
            "I don't have enough information to answer this question."
        );
    }

    #[tokio::test]
    async fn test_empty_prompt_is_422() {
        let app = app().await;
        let (status, body) = send(&app, json_request("POST", "/prompt", json!({ "prompt": "" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "validation_failed");
    }

    #[tokio::test]
    async fn test_whitespace_prompt_is_accepted() {
        let app = app().await;
        let (status, body) = send(&app, json_request("POST", "/prompt", json!({ "prompt": "   " }))).await;
        assert_eq!(status, StatusCode::OK, "body: {}", body);
        assert_eq!(body["status"], "pending");
    }

    #[tokio::test]
    async fn test_malformed_body_is_422() {
        let app = app().await;
        let (status, _) = send(&app, json_request("POST", "/prompt", json!({ "text": "hi" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod review_tests {
    use super::*;

    #[tokio::test]
    async fn test_review_once_then_400() {
        let app = app().await;
        let id = submit(&app, "What is RAG?").await["audit_id"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                &format!("/review/{}", id),
                json!({ "decision": "approved", "reviewer_id": "alice", "comments": "good" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Review submitted successfully");
        assert_eq!(body["decision"], "approved");
        assert_eq!(body["reviewer_id"], "alice");
        assert_eq!(body["audit_log"]["status"], "approved");
        assert!(body["audit_log"]["reviewed_at"].is_string());

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                &format!("/review/{}", id),
                json!({ "decision": "rejected", "reviewer_id": "bob" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "audit log already reviewed with status: approved"
        );

        let (_, record) = send(&app, get(&format!("/audit/{}", id))).await;
        assert_eq!(record["reviewer_id"], "alice");
    }

    #[tokio::test]
    async fn test_review_unknown_id_is_404() {
        let app = app().await;
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                &format!("/review/{}", uuid::Uuid::new_v4()),
                json!({ "decision": "approved", "reviewer_id": "alice" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_review_unknown_decision_is_422() {
        let app = app().await;
        let id = submit(&app, "What is NLP?").await["audit_id"]
            .as_str()
            .unwrap()
            .to_string();
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                &format!("/review/{}", id),
                json!({ "decision": "maybe", "reviewer_id": "alice" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

mod audit_tests {
    use super::*;

    #[tokio::test]
    async fn test_non_uuid_id_is_404() {
        let app = app().await;
        let (status, body) = send(&app, get("/audit/not-a-uuid")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "audit_not_found");
    }

    #[tokio::test]
    async fn test_list_limit_validation() {
        let app = app().await;
        let (status, _) = send(&app, get("/audit?limit=0")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _) = send(&app, get("/audit?limit=101")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, body) = send(&app, get("/audit")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pin_moves_record_to_top() {
        let app = app().await;
        let first = submit(&app, "What is machine learning?").await["audit_id"]
            .as_str()
            .unwrap()
            .to_string();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = submit(&app, "What is NLP?").await["audit_id"]
            .as_str()
            .unwrap()
            .to_string();

        let (_, list) = send(&app, get("/audit")).await;
        assert_eq!(list[0]["id"], second.as_str());

        let (status, body) = send(
            &app,
            json_request("PATCH", &format!("/audit/{}/pin", first), json!({ "pinned": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Pin status updated successfully");
        assert_eq!(body["pinned"], true);

        let (_, list) = send(&app, get("/audit")).await;
        assert_eq!(list[0]["id"], first.as_str());
        assert_eq!(list[1]["id"], second.as_str());
    }

    #[tokio::test]
    async fn test_rename() {
        let app = app().await;
        let id = submit(&app, "What is RAG?").await["audit_id"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, _) = send(
            &app,
            json_request(
                "PATCH",
                &format!("/audit/{}/rename", id),
                json!({ "custom_title": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(
            &app,
            json_request(
                "PATCH",
                &format!("/audit/{}/rename", id),
                json!({ "custom_title": "RAG primer" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["custom_title"], "RAG primer");

        let (_, record) = send(&app, get(&format!("/audit/{}", id))).await;
        assert_eq!(record["custom_title"], "RAG primer");
    }

    #[tokio::test]
    async fn test_delete_then_404() {
        let app = app().await;
        let id = submit(&app, "What is RAG?").await["audit_id"]
            .as_str()
            .unwrap()
            .to_string();
        let delete = |id: &str| {
            Request::builder()
                .method("DELETE")
                .uri(format!("/audit/{}", id))
                .body(Body::empty())
                .unwrap()
        };

        let (status, body) = send(&app, delete(&id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Audit log deleted successfully");

        let (status, _) = send(&app, delete(&id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get(&format!("/audit/{}", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_requires_admin_key_when_configured() {
        let config = Config {
            admin_key: Some("s3cret-admin-key".into()),
            ..Default::default()
        };
        let app = app_with(config, CANNED_ANSWER, true).await;
        let id = submit(&app, "What is RAG?").await["audit_id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/audit/{}", id);

        let req = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "invalid_admin_key");

        let req = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header("x-admin-key", "wrong")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.0, StatusCode::UNAUTHORIZED);

        // Reads stay open.
        assert_eq!(send(&app, get(&uri)).await.0, StatusCode::OK);

        let req = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header("authorization", "Bearer s3cret-admin-key")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.0, StatusCode::OK);
    }
}

mod analytics_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_is_zero_report() {
        let app = app().await;
        let (status, body) = send(&app, get("/analytics/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "total_conversations": 0,
                "total_suggestions": 0,
                "ai_acceptance_rate": 0.0,
                "approved_count": 0,
                "rejected_count": 0
            })
        );
    }

    #[tokio::test]
    async fn test_acceptance_rate_after_reviews() {
        let app = app().await;
        let mut ids = Vec::new();
        for prompt in ["What is RAG?", "What is NLP?", "What is AI?", "Explain deep learning"] {
            ids.push(submit(&app, prompt).await["audit_id"].as_str().unwrap().to_string());
        }

        let (_, body) = send(&app, get("/analytics/stats")).await;
        assert_eq!(body["total_conversations"], 4);
        assert_eq!(body["ai_acceptance_rate"], 100.0);

        for (id, decision) in ids.iter().zip(["approved", "approved", "rejected"]) {
            let (status, _) = send(
                &app,
                json_request(
                    "POST",
                    &format!("/review/{}", id),
                    json!({ "decision": decision, "reviewer_id": "carol" }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&app, get("/analytics/stats")).await;
        assert_eq!(body["total_suggestions"], 4);
        assert_eq!(body["approved_count"], 2);
        assert_eq!(body["rejected_count"], 1);
        assert_eq!(body["ai_acceptance_rate"], 66.7);
    }
}

mod surface_tests {
    use super::*;

    #[tokio::test]
    async fn test_root_and_health() {
        let app = app().await;
        let (status, body) = send(&app, get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["features"].as_array().unwrap().len(), 4);
        assert_eq!(body["confidence_threshold"], 0.6);
        assert_eq!(body["similarity_threshold"], 0.7);

        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "healthy", "version": "1.0.0" }));
    }

    #[tokio::test]
    async fn test_request_id_and_security_headers() {
        let app = app().await;
        let resp = app.clone().oneshot(get("/health")).await.unwrap();
        let headers = resp.headers();
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["cache-control"], "no-store");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = app().await;
        let (status, _) = send(&app, get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
