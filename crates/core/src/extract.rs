//! Rule-based financial entity extraction.
//!
//! Matches headlines against fixed, versioned vocabularies: known
//! institution names, metric synonyms, and directional keyword sets.
//! Deterministic and side-effect-free; unknown text yields empty sets and a
//! neutral directional.

use crate::domain::entities::{Directional, EntityResult};
use anyhow::Context;
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

/// Partial registry of recognizable institutions. A production deployment
/// would source the full registry from reference data.
const KNOWN_INSTITUTIONS: &[&str] = &[
    "Goldman Sachs",
    "JPMorgan",
    "Citigroup",
    "Citi",
    "Morgan Stanley",
    "Bank of America",
    "Wells Fargo",
    "Deutsche Bank",
    "HSBC",
    "Barclays",
    "BNP Paribas",
    "Santander",
    "ING",
    "Commerzbank",
    "Credit Suisse",
    "UBS",
    "ABN AMRO",
    "Lloyds",
    "NatWest",
    "Standard Chartered",
    "BlackRock",
    "Vanguard",
    "Fidelity",
    "PIMCO",
    "Bridgewater",
    "ECB",
    "Federal Reserve",
    "Fed",
    "Bank of England",
    "BoE",
    "Moody's",
    "S&P",
    "Fitch",
    "Visa",
    "Mastercard",
    "PayPal",
    "SWIFT",
    "DTCC",
    "Euroclear",
    "Clearstream",
];

/// (pattern, canonical metric name) pairs. Canonical names are the
/// controlled vocabulary the aggregator and consumers see.
const METRIC_PATTERNS: &[(&str, &str)] = &[
    (r"\bEPS\b", "earnings_per_share"),
    (r"\bEBITDA\b", "ebitda"),
    (r"\bEBIT\b", "ebit"),
    (r"\bROE\b", "return_on_equity"),
    (r"\bROA\b", "return_on_assets"),
    (r"\bNPL\b", "non_performing_loans"),
    (r"\bNIM\b", "net_interest_margin"),
    (r"\bCET1\b", "cet1_capital_ratio"),
    (r"\bAUM\b", "assets_under_management"),
    (r"\b(?:net\s+)?(?:profit|income)\b", "profit"),
    (r"\brevenue\b", "revenue"),
    (r"\boperating\s+(?:profit|income)\b", "operating_profit"),
    (r"\bdividend\b", "dividend"),
    (r"\bbuyback\b", "share_buyback"),
    (r"\bwrite(?:-?down|-?off)\b", "write_down"),
    (r"\bimpairment\b", "impairment"),
    (r"\bprovision\b", "loan_loss_provision"),
    (r"\bloan\s+loss\b", "loan_loss"),
];

const BULLISH_SIGNALS: &[&str] = &[
    "beats", "beat", "surges", "surge", "rises", "rise", "grows", "growth", "record", "raises",
    "strong", "above", "outperforms", "upgrade", "accretive", "expansion", "improves",
    "improvement", "recovery",
];

const BEARISH_SIGNALS: &[&str] = &[
    "misses", "miss", "falls", "decline", "drops", "warning", "cut", "below", "write-down",
    "writedown", "default", "breach", "fine", "collapse", "downgrade", "layoffs", "loss",
];

const MAX_NUMERICS: usize = 5;

pub struct EntityExtractor {
    institutions: Regex,
    metrics: Vec<(Regex, &'static str)>,
    numeric: Regex,
}

impl EntityExtractor {
    pub fn new() -> anyhow::Result<Self> {
        let alternation = KNOWN_INSTITUTIONS
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let institutions = RegexBuilder::new(&format!(r"\b({alternation})\b"))
            .case_insensitive(true)
            .build()
            .context("failed to compile institution pattern")?;

        let mut metrics = Vec::with_capacity(METRIC_PATTERNS.len());
        for (pattern, name) in METRIC_PATTERNS {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("failed to compile metric pattern for {name}"))?;
            metrics.push((re, *name));
        }

        // Currency/percentage mentions: $1.2bn, €500m, 15%, -3.2%.
        let numeric = RegexBuilder::new(
            r"(?:[\$€£¥])?\s*(-?\d+(?:\.\d+)?)\s*(?:bn|mn|m|k|trillion|billion|million|thousand)?\s*(?:%|percent|bps|bp)?",
        )
        .case_insensitive(true)
        .build()
        .context("failed to compile numeric pattern")?;

        Ok(Self {
            institutions,
            metrics,
            numeric,
        })
    }

    /// Extracts entities from a single headline. Never fails: an empty or
    /// unrecognized string yields the empty result.
    pub fn extract(&self, text: &str) -> EntityResult {
        let mut institutions = BTreeSet::new();
        for caps in self.institutions.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                // Insert the canonical registry spelling, not the match.
                if let Some(canonical) = KNOWN_INSTITUTIONS
                    .iter()
                    .find(|name| name.eq_ignore_ascii_case(m.as_str()))
                {
                    institutions.insert(canonical.to_string());
                }
            }
        }

        let mut metrics = BTreeSet::new();
        for (pattern, name) in &self.metrics {
            if pattern.is_match(text) {
                metrics.insert(name.to_string());
            }
        }

        let numerics: Vec<String> = self
            .numeric
            .captures_iter(text)
            .filter(|caps| {
                caps.get(1)
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                    .is_some_and(|v| v != 0.0)
            })
            .filter_map(|caps| caps.get(0).map(|m| m.as_str().trim().to_string()))
            .take(MAX_NUMERICS)
            .collect();

        let lower = text.to_lowercase();
        let bull = BULLISH_SIGNALS.iter().filter(|s| lower.contains(*s)).count();
        let bear = BEARISH_SIGNALS.iter().filter(|s| lower.contains(*s)).count();
        let directional = if bull > bear {
            Directional::Bullish
        } else if bear > bull {
            Directional::Bearish
        } else {
            Directional::Neutral
        };

        EntityResult {
            institutions,
            metrics,
            numerics,
            directional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new().unwrap()
    }

    #[test]
    fn finds_institutions_case_insensitively_with_canonical_names() {
        let r = extractor().extract("goldman sachs and HSBC face scrutiny from moody's");
        assert!(r.institutions.contains("Goldman Sachs"));
        assert!(r.institutions.contains("HSBC"));
        assert!(r.institutions.contains("Moody's"));
        assert_eq!(r.institutions.len(), 3);
    }

    #[test]
    fn finds_metrics_by_synonym() {
        let r = extractor().extract("EPS beats as revenue grows; NPL provision rises");
        assert!(r.metrics.contains("earnings_per_share"));
        assert!(r.metrics.contains("revenue"));
        assert!(r.metrics.contains("non_performing_loans"));
        assert!(r.metrics.contains("loan_loss_provision"));
    }

    #[test]
    fn bearish_majority_yields_bearish_directional() {
        let r = extractor().extract("Bank misses estimates, shares fall after profit warning");
        assert_eq!(r.directional, Directional::Bearish);
    }

    #[test]
    fn bullish_majority_yields_bullish_directional() {
        let r = extractor().extract("Revenue surges to record on strong growth");
        assert_eq!(r.directional, Directional::Bullish);
    }

    #[test]
    fn unknown_text_yields_the_empty_result() {
        let r = extractor().extract("the quick brown fox");
        assert!(r.institutions.is_empty());
        assert!(r.metrics.is_empty());
        assert!(r.numerics.is_empty());
        assert_eq!(r.directional, Directional::Neutral);
    }

    #[test]
    fn empty_string_never_fails() {
        let r = extractor().extract("");
        assert!(r.institutions.is_empty());
        assert_eq!(r.directional, Directional::Neutral);
    }

    #[test]
    fn numeric_mentions_are_captured_and_capped() {
        let r = extractor().extract("up 1% 2% 3% 4% 5% 6% 7%");
        assert_eq!(r.numerics.len(), MAX_NUMERICS);
        assert_eq!(r.numerics[0], "1%");
    }

    #[test]
    fn repeated_extraction_is_deterministic() {
        let e = extractor();
        let text = "Credit Suisse faces $2bn writedown, Moody's downgrade looms";
        assert_eq!(e.extract(text), e.extract(text));
    }
}
