use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered risk bucket, a pure function of the numeric score:
/// [0, 0.3) low, [0.3, 0.6) medium, [0.6, 0.8) elevated, [0.8, 1.0] high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.3 {
            RiskLevel::Low
        } else if score < 0.6 {
            RiskLevel::Medium
        } else if score < 0.8 {
            RiskLevel::Elevated
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::Elevated => "elevated",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score breakdown kept alongside the final number so every signal is
/// traceable to its inputs. Risk scores in banking fail review when they
/// cannot be decomposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub sentiment_direction: f64,
    pub entity_multiplier: f64,
    pub alignment_bonus: f64,
    pub raw_score: f64,
}

/// Composite risk signal for a single headline. The level is always
/// recoverable from the score alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSignal {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub components: ScoreComponents,
    pub recommendation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds_are_half_open_except_the_top() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.2999), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.5999), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_score(0.7999), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::High);
    }

    #[test]
    fn level_is_monotonic_in_score() {
        let mut last = RiskLevel::Low;
        let mut score = 0.0;
        while score <= 1.0 {
            let level = RiskLevel::from_score(score);
            assert!(level >= last, "level decreased at score {score}");
            last = level;
            score += 0.01;
        }
    }
}
