use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::http::{admin_auth, request_id, security_headers};
use crate::AppState;

pub mod analytics;
pub mod handlers;

/// Build the full HTTP surface with its middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    let admin_only = middleware::from_fn_with_state(state.clone(), admin_auth);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/prompt", post(handlers::submit_prompt))
        .route("/audit", get(handlers::list_audit_logs))
        .route(
            "/audit/:id",
            get(handlers::get_audit_log)
                .merge(delete(handlers::delete_audit_log).route_layer(admin_only)),
        )
        .route("/audit/:id/pin", patch(handlers::pin_audit_log))
        .route("/audit/:id/rename", patch(handlers::rename_audit_log))
        .route("/review/:id", post(handlers::review_audit_log))
        .route("/analytics/stats", get(analytics::get_stats))
        .fallback(fallback_404)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(security_headers))
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-admin-key"),
            HeaderName::from_static("x-request-id"),
        ]);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}
