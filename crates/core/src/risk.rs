//! Risk signal aggregation.
//!
//! Combines one sentiment result and one entity result into a composite
//! risk score:
//!
//!   direction  = confidence (negative) | 1 - confidence (positive) | 0.4 (neutral)
//!   multiplier = min(1 + 0.15 * institutions + 0.05 * metrics, 1.65)
//!   bonus      = +0.10 (negative & bearish) | -0.05 (positive & bullish) | 0
//!   score      = clamp(direction * multiplier + bonus, 0, 1)
//!
//! The formula is fixed: identical inputs must always produce the identical
//! score and recommendation, or the signal cannot be audited.

use crate::domain::entities::{Directional, EntityResult};
use crate::domain::risk::{RiskLevel, RiskSignal, ScoreComponents};
use crate::domain::sentiment::{SentimentLabel, SentimentResult};
use crate::error::AnalysisError;

/// Neutral sentiment still carries a baseline risk floor: confidence near a
/// decision boundary warrants attention. Tunable policy, not a derived value.
const NEUTRAL_BASELINE: f64 = 0.4;

const INSTITUTION_WEIGHT: f64 = 0.15;
const METRIC_WEIGHT: f64 = 0.05;
/// Cap so an entity-rich headline cannot dominate the sentiment signal.
const MULTIPLIER_CAP: f64 = 1.65;

const BEARISH_AGREEMENT_BONUS: f64 = 0.10;
const BULLISH_AGREEMENT_BONUS: f64 = -0.05;

/// Combines sentiment and entity results into a composite risk signal.
///
/// Pure and total over well-formed inputs. Out-of-range confidence or
/// per-class scores are an upstream contract breach and are rejected rather
/// than clamped; clamping here would mask the bug that produced them.
pub fn aggregate(
    sentiment: &SentimentResult,
    entities: &EntityResult,
) -> anyhow::Result<RiskSignal> {
    validate_sentiment(sentiment)?;

    let sentiment_direction = match sentiment.label {
        SentimentLabel::Negative => sentiment.confidence,
        SentimentLabel::Positive => 1.0 - sentiment.confidence,
        SentimentLabel::Neutral => NEUTRAL_BASELINE,
    };

    let entity_multiplier = (1.0
        + INSTITUTION_WEIGHT * entities.institutions.len() as f64
        + METRIC_WEIGHT * entities.metrics.len() as f64)
        .min(MULTIPLIER_CAP);

    // Agreement between the two independent signals adjusts the score;
    // disagreement is treated as noise and contributes nothing.
    let alignment_bonus = match (sentiment.label, entities.directional) {
        (SentimentLabel::Negative, Directional::Bearish) => BEARISH_AGREEMENT_BONUS,
        (SentimentLabel::Positive, Directional::Bullish) => BULLISH_AGREEMENT_BONUS,
        _ => 0.0,
    };

    let raw_score = sentiment_direction * entity_multiplier + alignment_bonus;
    let risk_score = raw_score.clamp(0.0, 1.0);
    let risk_level = RiskLevel::from_score(risk_score);

    Ok(RiskSignal {
        risk_score,
        risk_level,
        components: ScoreComponents {
            sentiment_direction,
            entity_multiplier,
            alignment_bonus,
            raw_score,
        },
        recommendation: recommendation(risk_level, sentiment.label).to_string(),
    })
}

fn validate_sentiment(sentiment: &SentimentResult) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&sentiment.confidence) {
        return Err(AnalysisError::precondition(
            "aggregate",
            format!(
                "confidence out of range: {} (model={})",
                sentiment.confidence, sentiment.model
            ),
        )
        .into());
    }
    for (label, score) in &sentiment.scores {
        if !(0.0..=1.0).contains(score) {
            return Err(AnalysisError::precondition(
                "aggregate",
                format!("score for {label} out of range: {score}"),
            )
            .into());
        }
    }
    Ok(())
}

/// Fixed recommendation lookup keyed on (risk level, sentiment label).
/// All 12 combinations resolve to a non-empty, human-readable string.
fn recommendation(level: RiskLevel, label: SentimentLabel) -> &'static str {
    match (level, label) {
        (RiskLevel::Low, SentimentLabel::Positive) => {
            "Opportunity — positive signal, consider for investment committee briefing"
        }
        (RiskLevel::Low, SentimentLabel::Neutral) => {
            "Monitor — quiet signal, continue standard monitoring"
        }
        (RiskLevel::Low, SentimentLabel::Negative) => {
            "Monitor — weak negative signal, continue standard monitoring"
        }
        (RiskLevel::Medium, SentimentLabel::Positive) => {
            "Watch — positive sentiment with mixed context, check next 24h"
        }
        (RiskLevel::Medium, SentimentLabel::Neutral) => {
            "Watch — neutral or mixed signals, check next 24h"
        }
        (RiskLevel::Medium, SentimentLabel::Negative) => {
            "Watch — moderate negative signal, check next 24h"
        }
        (RiskLevel::Elevated, SentimentLabel::Positive) => {
            "Review — score and sentiment disagree, analyst attention required"
        }
        (RiskLevel::Elevated, SentimentLabel::Neutral) => {
            "Review — elevated score on ambiguous sentiment, analyst attention required"
        }
        (RiskLevel::Elevated, SentimentLabel::Negative) => {
            "Review — negative signal with entity context, analyst attention required"
        }
        (RiskLevel::High, SentimentLabel::Positive) => {
            "Escalate — high risk score despite positive sentiment, verify source"
        }
        (RiskLevel::High, SentimentLabel::Neutral) => {
            "Escalate — high risk score on uncertain sentiment, verify immediately"
        }
        (RiskLevel::High, SentimentLabel::Negative) => {
            "Escalate — high-confidence negative signal involving known institution"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AnalysisError, ErrorKind};
    use std::collections::{BTreeMap, BTreeSet};

    fn sentiment(label: SentimentLabel, confidence: f64) -> SentimentResult {
        SentimentResult {
            text: "headline".to_string(),
            label,
            confidence,
            scores: BTreeMap::new(),
            model: "test".to_string(),
            latency_ms: 0.0,
        }
    }

    fn entities(
        institutions: &[&str],
        metrics: &[&str],
        directional: Directional,
    ) -> EntityResult {
        EntityResult {
            institutions: institutions.iter().map(|s| s.to_string()).collect(),
            metrics: metrics.iter().map(|s| s.to_string()).collect(),
            numerics: Vec::new(),
            directional,
        }
    }

    #[test]
    fn negative_with_no_entities_scores_its_confidence() {
        for confidence in [0.0, 0.25, 0.5, 0.73, 1.0] {
            let signal = aggregate(
                &sentiment(SentimentLabel::Negative, confidence),
                &EntityResult::empty(),
            )
            .unwrap();
            assert_eq!(signal.risk_score, confidence);
            assert_eq!(signal.components.entity_multiplier, 1.0);
        }
    }

    #[test]
    fn positive_with_no_entities_scores_one_minus_confidence() {
        for confidence in [0.0, 0.25, 0.5, 0.73, 1.0] {
            let signal = aggregate(
                &sentiment(SentimentLabel::Positive, confidence),
                &EntityResult::empty(),
            )
            .unwrap();
            assert_eq!(signal.risk_score, 1.0 - confidence);
        }
    }

    #[test]
    fn neutral_carries_the_baseline_floor() {
        let signal = aggregate(
            &sentiment(SentimentLabel::Neutral, 0.5),
            &entities(&[], &[], Directional::Neutral),
        )
        .unwrap();
        assert_eq!(signal.risk_score, 0.4);
        assert_eq!(signal.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn multiplier_is_capped_even_with_many_entities() {
        let institutions: Vec<String> = (0..50).map(|i| format!("Bank {i}")).collect();
        let metrics: Vec<String> = (0..50).map(|i| format!("metric_{i}")).collect();
        let e = EntityResult {
            institutions: institutions.iter().cloned().collect::<BTreeSet<_>>(),
            metrics: metrics.iter().cloned().collect::<BTreeSet<_>>(),
            numerics: Vec::new(),
            directional: Directional::Neutral,
        };
        let signal = aggregate(&sentiment(SentimentLabel::Negative, 0.5), &e).unwrap();
        assert_eq!(signal.components.entity_multiplier, 1.65);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let labels = [
            SentimentLabel::Positive,
            SentimentLabel::Neutral,
            SentimentLabel::Negative,
        ];
        let directionals = [
            Directional::Bullish,
            Directional::Bearish,
            Directional::Neutral,
        ];
        for label in labels {
            for directional in directionals {
                for confidence in [0.0, 0.01, 0.5, 0.99, 1.0] {
                    for n_inst in [0usize, 1, 5, 50] {
                        let e = EntityResult {
                            institutions: (0..n_inst).map(|i| format!("Bank {i}")).collect(),
                            metrics: ["revenue", "eps"].iter().map(|s| s.to_string()).collect(),
                            numerics: Vec::new(),
                            directional,
                        };
                        let signal = aggregate(&sentiment(label, confidence), &e).unwrap();
                        assert!(
                            (0.0..=1.0).contains(&signal.risk_score),
                            "score {} out of range",
                            signal.risk_score
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn bearish_agreement_raises_and_bullish_agreement_lowers() {
        let bearish = aggregate(
            &sentiment(SentimentLabel::Negative, 0.5),
            &entities(&[], &[], Directional::Bearish),
        )
        .unwrap();
        assert_eq!(bearish.components.alignment_bonus, 0.10);
        assert_eq!(bearish.risk_score, 0.6);

        let bullish = aggregate(
            &sentiment(SentimentLabel::Positive, 0.5),
            &entities(&[], &[], Directional::Bullish),
        )
        .unwrap();
        assert_eq!(bullish.components.alignment_bonus, -0.05);
        assert_eq!(bullish.risk_score, 0.45);
    }

    #[test]
    fn disagreement_contributes_nothing() {
        let signal = aggregate(
            &sentiment(SentimentLabel::Negative, 0.7),
            &entities(&[], &[], Directional::Bullish),
        )
        .unwrap();
        assert_eq!(signal.components.alignment_bonus, 0.0);
        assert_eq!(signal.risk_score, 0.7);
    }

    #[test]
    fn high_confidence_negative_bearish_scenario_saturates() {
        // 0.94 * 1.20 + 0.10 = 1.228 -> clamped to 1.0 -> high.
        let signal = aggregate(
            &sentiment(SentimentLabel::Negative, 0.94),
            &entities(
                &["Moody's"],
                &["non_performing_loans"],
                Directional::Bearish,
            ),
        )
        .unwrap();
        assert!((signal.components.entity_multiplier - 1.20).abs() < 1e-12);
        assert_eq!(signal.components.alignment_bonus, 0.10);
        assert!((signal.components.raw_score - 1.228).abs() < 1e-12);
        assert_eq!(signal.risk_score, 1.0);
        assert_eq!(signal.risk_level, RiskLevel::High);
        assert_eq!(
            signal.recommendation,
            "Escalate — high-confidence negative signal involving known institution"
        );
    }

    #[test]
    fn aggregate_is_idempotent() {
        let s = sentiment(SentimentLabel::Negative, 0.81);
        let e = entities(&["HSBC"], &["revenue"], Directional::Bearish);
        let first = aggregate(&s, &e).unwrap();
        let second = aggregate(&s, &e).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_confidence_is_a_precondition_error() {
        for confidence in [-0.1, 1.1, f64::NAN] {
            let err = aggregate(
                &sentiment(SentimentLabel::Negative, confidence),
                &EntityResult::empty(),
            )
            .unwrap_err();
            let analysis = err.downcast_ref::<AnalysisError>().unwrap();
            assert_eq!(analysis.kind, ErrorKind::Precondition);
        }
    }

    #[test]
    fn out_of_range_class_score_is_a_precondition_error() {
        let mut s = sentiment(SentimentLabel::Positive, 0.5);
        s.scores.insert(SentimentLabel::Positive, 1.2);
        let err = aggregate(&s, &EntityResult::empty()).unwrap_err();
        let analysis = err.downcast_ref::<AnalysisError>().unwrap();
        assert_eq!(analysis.kind, ErrorKind::Precondition);
    }

    #[test]
    fn every_level_label_pair_has_a_recommendation() {
        let levels = [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::Elevated,
            RiskLevel::High,
        ];
        let labels = [
            SentimentLabel::Positive,
            SentimentLabel::Neutral,
            SentimentLabel::Negative,
        ];
        for level in levels {
            for label in labels {
                assert!(!recommendation(level, label).is_empty());
            }
        }
        assert_eq!(
            recommendation(RiskLevel::Low, SentimentLabel::Positive),
            "Opportunity — positive signal, consider for investment committee briefing"
        );
    }
}
