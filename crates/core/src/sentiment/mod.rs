pub mod finbert;
pub mod lexicon;

pub use finbert::FinbertClassifier;
pub use lexicon::LexiconClassifier;

use crate::config::Settings;
use crate::domain::sentiment::SentimentResult;
use std::sync::Arc;

/// Capability shared by the model-backed and lexicon-backed classifiers.
/// The two are substitutable without any caller change.
#[async_trait::async_trait]
pub trait SentimentClassifier: Send + Sync {
    fn model_name(&self) -> &str;

    /// Classifies one headline. Fails on empty or malformed input; the
    /// failure is recoverable at the pipeline level as an item-level error.
    async fn classify(&self, text: &str) -> anyhow::Result<SentimentResult>;
}

/// Selects a backend at construction time. The model-backed variant needs
/// a configured inference endpoint; the lexicon variant has no dependencies.
pub fn backend_from_settings(
    use_model_backend: bool,
    settings: &Settings,
) -> anyhow::Result<Arc<dyn SentimentClassifier>> {
    if use_model_backend {
        Ok(Arc::new(FinbertClassifier::from_settings(settings)?))
    } else {
        Ok(Arc::new(LexiconClassifier::new()))
    }
}
