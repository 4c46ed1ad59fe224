//! Lexicon-backed sentiment fallback.
//!
//! Keyword lists drawn from CFA Level 1 glossary and analyst report
//! patterns. Trades accuracy for independence from a model artifact and
//! near-zero latency; no sarcasm or negation handling.

use crate::domain::sentiment::{SentimentLabel, SentimentResult};
use crate::error::AnalysisError;
use crate::sentiment::SentimentClassifier;
use std::collections::BTreeMap;
use std::time::Instant;

const MODEL_NAME: &str = "lexicon-keyword-v1";

const BASE_CONFIDENCE: f64 = 0.5;
const PER_HIT_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;
const NEUTRAL_CONFIDENCE: f64 = 0.60;

const POSITIVE_KEYWORDS: &[&str] = &[
    "beats",
    "record",
    "surge",
    "strong",
    "growth",
    "raises guidance",
    "outperforms",
    "profit up",
    "revenue growth",
    "dividend increase",
    "upgrade",
    "buyback",
    "acquisition accretive",
    "cost reduction",
    "margin expansion",
    "above expectations",
    "recovery",
    "resilient",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "misses",
    "warning",
    "writedown",
    "write-off",
    "loss",
    "decline",
    "downgrade",
    "default",
    "breach",
    "violation",
    "lawsuit",
    "fine",
    "layoffs",
    "collapse",
    "below expectations",
    "guidance cut",
    "impairment",
    "npl",
    "non-performing",
    "provision",
    "outflows",
];

#[derive(Debug, Clone, Default)]
pub struct LexiconClassifier;

impl LexiconClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for LexiconClassifier {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    async fn classify(&self, text: &str) -> anyhow::Result<SentimentResult> {
        if text.trim().is_empty() {
            return Err(AnalysisError::classification("lexicon", "empty input text").into());
        }

        let started = Instant::now();
        let lower = text.to_lowercase();

        let pos_hits = POSITIVE_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();
        let neg_hits = NEGATIVE_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();

        let (label, confidence) = if pos_hits > neg_hits {
            (SentimentLabel::Positive, hit_confidence(pos_hits))
        } else if neg_hits > pos_hits {
            (SentimentLabel::Negative, hit_confidence(neg_hits))
        } else {
            (SentimentLabel::Neutral, NEUTRAL_CONFIDENCE)
        };

        Ok(SentimentResult {
            text: text.to_string(),
            label,
            confidence,
            scores: distribution(label, confidence),
            model: MODEL_NAME.to_string(),
            latency_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

fn hit_confidence(hits: usize) -> f64 {
    (BASE_CONFIDENCE + hits as f64 * PER_HIT_CONFIDENCE).min(MAX_CONFIDENCE)
}

/// Approximate distribution: winning class keeps the confidence, the
/// remainder splits evenly across the other two.
fn distribution(label: SentimentLabel, confidence: f64) -> BTreeMap<SentimentLabel, f64> {
    let rest = (1.0 - confidence) / 2.0;
    let mut scores = BTreeMap::new();
    scores.insert(SentimentLabel::Positive, rest);
    scores.insert(SentimentLabel::Neutral, rest);
    scores.insert(SentimentLabel::Negative, rest);
    scores.insert(label, confidence);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, ErrorKind};

    #[tokio::test]
    async fn positive_keywords_win() {
        let c = LexiconClassifier::new();
        let r = c
            .classify("Goldman Sachs beats expectations on record revenue growth")
            .await
            .unwrap();
        assert_eq!(r.label, SentimentLabel::Positive);
        assert!(r.confidence > 0.5);
        assert_eq!(r.model, "lexicon-keyword-v1");
    }

    #[tokio::test]
    async fn negative_keywords_win() {
        let c = LexiconClassifier::new();
        let r = c
            .classify("Deutsche Bank warning: NPL impairment and writedown loom")
            .await
            .unwrap();
        assert_eq!(r.label, SentimentLabel::Negative);
        assert!(r.is_risk_signal());
    }

    #[tokio::test]
    async fn no_hits_is_neutral_at_fixed_confidence() {
        let c = LexiconClassifier::new();
        let r = c
            .classify("Bank of England holds rates steady")
            .await
            .unwrap();
        assert_eq!(r.label, SentimentLabel::Neutral);
        assert_eq!(r.confidence, 0.60);
    }

    #[tokio::test]
    async fn confidence_is_capped() {
        let c = LexiconClassifier::new();
        let text = "misses warning writedown loss decline downgrade default breach lawsuit fine";
        let r = c.classify(text).await.unwrap();
        assert_eq!(r.label, SentimentLabel::Negative);
        assert_eq!(r.confidence, 0.95);
    }

    #[tokio::test]
    async fn empty_input_is_a_classification_error() {
        let c = LexiconClassifier::new();
        let err = c.classify("   ").await.unwrap_err();
        let analysis = err.downcast_ref::<AnalysisError>().unwrap();
        assert_eq!(analysis.kind, ErrorKind::Classification);
    }

    #[test]
    fn distribution_is_a_valid_score_map() {
        let scores = distribution(SentimentLabel::Negative, 0.8);
        assert_eq!(scores[&SentimentLabel::Negative], 0.8);
        assert!((scores[&SentimentLabel::Positive] - 0.1).abs() < 1e-12);
        assert!(scores.values().all(|v| (0.0..=1.0).contains(v)));
    }
}
