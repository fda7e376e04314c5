use wayfarer_core::trip::{DayPlan, LOW_BUDGET_PER_DAY};

const BASE_SCORE: f64 = 0.8;
const UNVERIFIED_PENALTY: f64 = 0.4;
const LOW_BUDGET_PENALTY: f64 = 0.1;

/// Deterministic plan confidence in `[0, 1]`, rounded to two decimals.
///
/// 0.8 for a non-empty itinerary, minus 0.4 times the share of unverified
/// places, minus 0.1 when the daily budget is under the low-budget line.
pub fn evaluate_confidence(itinerary: &[DayPlan], daily_budget: Option<f64>) -> f64 {
    if itinerary.is_empty() {
        return 0.0;
    }

    let mut score = BASE_SCORE;

    let total = itinerary.iter().map(|d| d.places.len()).sum::<usize>();
    if total > 0 {
        let unverified = itinerary
            .iter()
            .flat_map(|d| d.places.iter())
            .filter(|p| !p.is_verified())
            .count();
        score -= UNVERIFIED_PENALTY * (unverified as f64 / total as f64);
    }

    if daily_budget.is_some_and(|b| b < LOW_BUDGET_PER_DAY) {
        score -= LOW_BUDGET_PENALTY;
    }

    (score.clamp(0.0, 1.0) * 100.0).round() / 100.0
}
