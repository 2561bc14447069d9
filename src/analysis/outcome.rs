use serde::{Deserialize, Serialize};

use super::sentiment::SentimentScorer;
use crate::db::Outcome;

/// Normalized sentiment at or above which a customer counts as interested.
pub const INTERESTED_THRESHOLD: f64 = 0.65;
/// Normalized sentiment at or above which a customer counts as neutral.
pub const NEUTRAL_THRESHOLD: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub outcome: Outcome,
    /// Compound score mapped onto [0, 1]
    pub sentiment: f64,
}

/// Maps a compound score in [-1, 1] onto [0, 1]. Out-of-range input is
/// clamped and NaN reads as neutral.
pub fn normalize(compound: f64) -> f64 {
    if compound.is_nan() {
        return 0.5;
    }
    ((compound + 1.0) / 2.0).clamp(0.0, 1.0)
}

pub fn outcome_for(normalized: f64) -> Outcome {
    if normalized >= INTERESTED_THRESHOLD {
        Outcome::Interested
    } else if normalized >= NEUTRAL_THRESHOLD {
        Outcome::Neutral
    } else {
        Outcome::NotInterested
    }
}

pub fn classify(compound: f64) -> Classification {
    let sentiment = normalize(compound);
    Classification {
        outcome: outcome_for(sentiment),
        sentiment,
    }
}

pub fn classify_text(scorer: &dyn SentimentScorer, text: &str) -> Classification {
    classify(scorer.compound(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScorer(f64);

    impl SentimentScorer for FixedScorer {
        fn compound(&self, _text: &str) -> f64 {
            self.0
        }

        fn name(&self) -> &'static str {
            "FixedScorer"
        }
    }

    #[test]
    fn test_positive_compound_is_interested() {
        let result = classify(0.5);
        assert_eq!(result.sentiment, 0.75);
        assert_eq!(result.outcome, Outcome::Interested);
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive_below() {
        assert_eq!(outcome_for(0.65), Outcome::Interested);
        assert_eq!(outcome_for(0.6499), Outcome::Neutral);
        assert_eq!(outcome_for(0.35), Outcome::Neutral);
        assert_eq!(outcome_for(0.3499), Outcome::NotInterested);
        assert_eq!(outcome_for(0.0), Outcome::NotInterested);
        assert_eq!(outcome_for(1.0), Outcome::Interested);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(classify(-1.0).sentiment, 0.0);
        assert_eq!(classify(-1.0).outcome, Outcome::NotInterested);
        assert_eq!(classify(1.0).sentiment, 1.0);
        assert_eq!(classify(0.0).sentiment, 0.5);
        assert_eq!(classify(0.0).outcome, Outcome::Neutral);
    }

    #[test]
    fn test_normalized_score_always_in_unit_range() {
        let mut compound = -1.0;
        while compound <= 1.0 {
            let result = classify(compound);
            assert!((0.0..=1.0).contains(&result.sentiment));
            assert_eq!(result.outcome, outcome_for(result.sentiment));
            compound += 0.01;
        }
        assert_eq!(normalize(3.0), 1.0);
        assert_eq!(normalize(-3.0), 0.0);
        assert_eq!(normalize(f64::NAN), 0.5);
    }

    #[test]
    fn test_classify_text_uses_scorer() {
        let result = classify_text(&FixedScorer(-0.8), "whatever");
        assert_eq!(result.outcome, Outcome::NotInterested);
        assert!((result.sentiment - 0.1).abs() < 1e-9);
    }
}
