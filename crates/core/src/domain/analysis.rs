use crate::domain::entities::EntityResult;
use crate::domain::risk::{RiskLevel, RiskSignal};
use crate::domain::sentiment::{SentimentLabel, SentimentResult};
use crate::error::ErrorKind;
use serde::Serialize;

/// Per-item outcome inside a batch. A failed classification never crosses
/// the batch boundary as an error; it occupies the item's slot instead.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    Ok {
        sentiment: SentimentResult,
        entities: EntityResult,
        risk: RiskSignal,
    },
    Error {
        kind: ErrorKind,
        detail: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub text: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentCounts {
    fn bump(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub low: usize,
    pub medium: usize,
    pub elevated: usize,
    pub high: usize,
}

impl RiskCounts {
    fn bump(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Elevated => self.elevated += 1,
            RiskLevel::High => self.high += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BatchSummary {
    pub sentiment: SentimentCounts,
    pub risk: RiskCounts,
    pub failed: usize,
}

/// Analysis results for a whole batch, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub count: usize,
    pub items: Vec<BatchItem>,
    pub summary: BatchSummary,
}

impl BatchResult {
    /// Assembles the batch and computes summary histograms in one pass.
    /// Histograms count successful items; failures are tallied separately.
    pub fn from_items(items: Vec<BatchItem>) -> Self {
        let mut summary = BatchSummary::default();
        for item in &items {
            match &item.outcome {
                ItemOutcome::Ok {
                    sentiment, risk, ..
                } => {
                    summary.sentiment.bump(sentiment.label);
                    summary.risk.bump(risk.risk_level);
                }
                ItemOutcome::Error { .. } => summary.failed += 1,
            }
        }
        Self {
            count: items.len(),
            items,
            summary,
        }
    }

    /// Successful items only, in input order.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &SentimentResult, &EntityResult, &RiskSignal)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            ItemOutcome::Ok {
                sentiment,
                entities,
                risk,
            } => Some((item.text.as_str(), sentiment, entities, risk)),
            ItemOutcome::Error { .. } => None,
        })
    }
}
