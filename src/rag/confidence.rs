//! Distance → similarity → confidence.

/// Map a metric distance to a similarity in (0, 1]. Negative distances are
/// treated as an exact match.
pub fn distance_to_similarity(distance: f64) -> f64 {
    1.0 / (1.0 + distance.max(0.0))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Mean similarity, clamped to [0, 1] and rounded to 4 decimals. 0.0 when
/// nothing was retrieved.
pub fn calculate_confidence(similarities: &[f64]) -> f64 {
    if similarities.is_empty() {
        return 0.0;
    }
    let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
    round_to(mean.clamp(0.0, 1.0), 4)
}
