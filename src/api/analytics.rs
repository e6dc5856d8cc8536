use std::sync::Arc;

use axum::{extract::State, Json};

use crate::models::analytics::AnalyticsStats;
use crate::AppState;

/// GET /analytics/stats: review outcomes over the recent window. Always 200.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<AnalyticsStats> {
    Json(state.audit.analytics().await)
}
