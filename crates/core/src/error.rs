use serde::Serialize;
use std::fmt;

/// Where in the analysis an error belongs, and how the pipeline treats it.
///
/// Classification and extraction failures are recoverable at the batch
/// level: they become item-level error slots. Precondition violations mean
/// an upstream component broke its contract and are never swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Precondition,
    Classification,
    Extraction,
}

#[derive(Debug, Clone)]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub stage: &'static str,
    pub detail: String,
}

impl AnalysisError {
    pub fn precondition(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Precondition,
            stage,
            detail: detail.into(),
        }
    }

    pub fn classification(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Classification,
            stage,
            detail: detail.into(),
        }
    }

    pub fn extraction(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Extraction,
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "analysis error (kind={:?}, stage={}): {}",
            self.kind, self.stage, self.detail
        )
    }
}

impl std::error::Error for AnalysisError {}
