use vader_sentiment::SentimentIntensityAnalyzer;

/// Maps free text to a compound polarity score in [-1, 1].
pub trait SentimentScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;

    /// Get the name of this scorer for logging
    fn name(&self) -> &'static str;
}

/// VADER rule-based scorer over the full VADER lexicon.
#[derive(Debug, Default, Clone)]
pub struct VaderScorer;

impl VaderScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        let analyzer = SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(text);
        scores
            .get("compound")
            .copied()
            .filter(|score| score.is_finite())
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "VADER"
    }
}
