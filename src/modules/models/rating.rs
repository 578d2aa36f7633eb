use serde::{Deserialize, Serialize};

use crate::modules::helpers::math::Math;
use crate::modules::models::lap::{default_team, LapHistoryStore};
use crate::modules::models::team::BaselineTracker;

/// amount of recent laps a kart is rated on
pub const RATING_WINDOW: usize = 8;
/// laps needed before a kart is rated at all
pub const MIN_RATED_LAPS: usize = 2;

const BASE_SCORE: f64 = 500.0;
const AVERAGE_WEIGHT: f64 = 200.0;
const VOLATILITY_WEIGHT: f64 = 50.0;
const BEST_LAP_WEIGHT: f64 = 30.0;
const MAX_CONFIDENCE: f64 = 0.99;
/// lap count at which confidence would reach 1.0 without the cap
const FULL_CONFIDENCE_LAPS: f64 = 50.0;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub kart_id: String,
    pub avg: f64,
    pub best: f64,
    pub std: f64,
    pub score: f64,
    pub confidence: f64,
    pub stint: u32,
}

pub struct RatingEngine {}

impl RatingEngine {
    /// # rate all karts
    /// rate every kart with at least two laps on its last eight laps.
    ///
    /// the score rewards an average below the team baseline, punishes an
    /// inconsistent window and rewards a best lap below the baseline.
    /// a kart without a team profile is rated against its own average.
    ///
    /// ## Arguments
    /// * `laps` - the lap history of the session
    /// * `baselines` - the team baselines
    ///
    /// ## Returns
    /// * `Vec<ScoreEntry>` - the ratings, best score first
    pub fn compute(laps: &LapHistoryStore, baselines: &BaselineTracker) -> Vec<ScoreEntry> {
        let mut scores: Vec<ScoreEntry> = laps
            .iter()
            .filter(|(_, history)| history.len() >= MIN_RATED_LAPS)
            .map(|(kart_id, history)| {
                let window: Vec<f64> = Math::tail(history, RATING_WINDOW)
                    .iter()
                    .map(|lap| lap.time())
                    .collect();

                let avg = Math::mean(&window);
                let best = Math::min(&window);
                let std = Math::standard_deviation(&window);

                let last = history.last();
                let team = last
                    .map(|lap| lap.team().to_string())
                    .unwrap_or_else(|| default_team(kart_id));
                let baseline = baselines.baseline(&team).unwrap_or(avg);

                ScoreEntry {
                    kart_id: kart_id.to_string(),
                    avg,
                    best,
                    std,
                    score: RatingEngine::score(baseline, avg, best, std),
                    confidence: RatingEngine::confidence(history.len()),
                    stint: last.map(|lap| lap.stint()).unwrap_or(0),
                }
            })
            .collect();

        // stable, equal scores stay in kart order
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores
    }

    pub fn score(baseline: f64, avg: f64, best: f64, std: f64) -> f64 {
        let delta = baseline - avg;
        BASE_SCORE + delta * AVERAGE_WEIGHT - std * VOLATILITY_WEIGHT + (baseline - best) * BEST_LAP_WEIGHT
    }

    /// grows with the amount of laps, capped at 0.99
    pub fn confidence(total_laps: usize) -> f64 {
        let confidence = (1.0 + total_laps as f64).ln() / (1.0 + FULL_CONFIDENCE_LAPS).ln();
        confidence.min(MAX_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::RatingEngine;

    #[test]
    fn score_at_baseline_without_spread_is_the_base() {
        assert_eq!(RatingEngine::score(50.0, 50.0, 50.0, 0.0), 500.0);
        // one second under the baseline on average and best lap
        assert!((RatingEngine::score(50.0, 49.0, 49.0, 0.0) - 730.0).abs() < 1e-9);
    }

    #[test]
    fn volatility_is_penalized() {
        let steady = RatingEngine::score(50.0, 49.0, 48.0, 0.2);
        let erratic = RatingEngine::score(50.0, 49.0, 48.0, 0.8);
        assert!(steady > erratic);
    }

    #[test]
    fn confidence_grows_and_is_capped() {
        assert_eq!(RatingEngine::confidence(0), 0.0);
        assert!(RatingEngine::confidence(20) >= RatingEngine::confidence(5));
        assert!((RatingEngine::confidence(20) - 21f64.ln() / 51f64.ln()).abs() < 1e-12);
        assert_eq!(RatingEngine::confidence(50), 0.99);
        assert_eq!(RatingEngine::confidence(10_000), 0.99);
    }
}
