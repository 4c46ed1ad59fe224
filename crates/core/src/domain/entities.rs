use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Directional cue derived from keyword matches, independent of the
/// sentiment classifier's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directional {
    Bullish,
    Bearish,
    Neutral,
}

impl Directional {
    pub fn as_str(&self) -> &'static str {
        match self {
            Directional::Bullish => "bullish",
            Directional::Bearish => "bearish",
            Directional::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Directional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities recognized in a single headline. Created once by the extractor
/// and never mutated. Unknown text yields the empty result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityResult {
    pub institutions: BTreeSet<String>,
    pub metrics: BTreeSet<String>,
    pub numerics: Vec<String>,
    pub directional: Directional,
}

impl EntityResult {
    pub fn empty() -> Self {
        Self {
            institutions: BTreeSet::new(),
            metrics: BTreeSet::new(),
            numerics: Vec::new(),
            directional: Directional::Neutral,
        }
    }
}
