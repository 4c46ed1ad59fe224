use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A headline is flagged as a risk signal when it is negative with at least
/// this much confidence. Used only as a cheap pre-filter hint downstream.
pub const RISK_SIGNAL_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of sentiment classification for a single headline.
///
/// Created once by a classifier and never mutated. `scores` holds the
/// per-class distribution; values are non-negative and at most 1 but need
/// not sum exactly to 1 (floating rounding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    pub text: String,
    pub label: SentimentLabel,
    pub confidence: f64,
    pub scores: BTreeMap<SentimentLabel, f64>,
    pub model: String,
    pub latency_ms: f64,
}

impl SentimentResult {
    pub fn is_risk_signal(&self) -> bool {
        self.label == SentimentLabel::Negative && self.confidence >= RISK_SIGNAL_CONFIDENCE
    }
}
