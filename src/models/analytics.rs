use serde::{Deserialize, Serialize};

use super::audit::ReviewStatus;

/// Aggregate counts behind `GET /analytics/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsStats {
    pub total_conversations: i64,
    pub total_suggestions: i64,
    /// approved / (approved + rejected) × 100, one decimal.
    pub ai_acceptance_rate: f64,
    pub approved_count: i64,
    pub rejected_count: i64,
}

impl AnalyticsStats {
    /// The report returned when nothing can be counted.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Aggregate a window of statuses. Pending records count toward the total
    /// but not toward the acceptance rate; with nothing reviewed the rate is 100.
    pub fn from_statuses(statuses: &[ReviewStatus]) -> Self {
        if statuses.is_empty() {
            return Self::zero();
        }

        let total = statuses.len() as i64;
        let approved = statuses
            .iter()
            .filter(|s| **s == ReviewStatus::Approved)
            .count() as i64;
        let rejected = statuses
            .iter()
            .filter(|s| **s == ReviewStatus::Rejected)
            .count() as i64;

        let reviewed = approved + rejected;
        let rate = if reviewed > 0 {
            approved as f64 / reviewed as f64 * 100.0
        } else {
            100.0
        };

        Self {
            total_conversations: total,
            total_suggestions: total,
            ai_acceptance_rate: (rate * 10.0).round() / 10.0,
            approved_count: approved,
            rejected_count: rejected,
        }
    }
}
