//! Batch orchestration: sentiment + entity extraction per headline, folded
//! through the risk aggregator into one signal per input text.

use crate::config::Settings;
use crate::domain::analysis::{BatchItem, BatchResult, ItemOutcome};
use crate::domain::entities::EntityResult;
use crate::domain::risk::RiskSignal;
use crate::domain::sentiment::SentimentResult;
use crate::error::{AnalysisError, ErrorKind};
use crate::extract::EntityExtractor;
use crate::risk;
use crate::sentiment::{self, SentimentClassifier};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model-backed (FinBERT-style) classifier vs the lexicon fallback.
    pub use_model_backend: bool,
    /// Whether per-class sentiment scores are retained in output.
    pub include_raw_scores: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_model_backend: true,
            include_raw_scores: true,
        }
    }
}

pub struct Pipeline {
    classifier: Arc<dyn SentimentClassifier>,
    extractor: Arc<EntityExtractor>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn from_settings(config: PipelineConfig, settings: &Settings) -> anyhow::Result<Self> {
        let classifier = sentiment::backend_from_settings(config.use_model_backend, settings)?;
        Self::with_classifier(config, classifier)
    }

    /// Constructs a pipeline around an already-built classifier. The two
    /// classifier variants are substitutable here without caller changes.
    pub fn with_classifier(
        config: PipelineConfig,
        classifier: Arc<dyn SentimentClassifier>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            classifier,
            extractor: Arc::new(EntityExtractor::new()?),
            config,
        })
    }

    pub fn model_name(&self) -> &str {
        self.classifier.model_name()
    }

    /// Analyzes a batch of headlines. Items are evaluated concurrently and
    /// reassembled in input order. A classification failure on one item
    /// becomes that item's error slot; the batch always covers every input.
    /// Aggregator precondition violations are an upstream contract breach
    /// and propagate immediately instead of being recorded per item.
    pub async fn run(&self, texts: &[String]) -> anyhow::Result<BatchResult> {
        let mut handles = Vec::with_capacity(texts.len());
        for text in texts {
            let classifier = Arc::clone(&self.classifier);
            let extractor = Arc::clone(&self.extractor);
            let include_raw_scores = self.config.include_raw_scores;
            let text = text.clone();
            handles.push(tokio::spawn(async move {
                analyze_item(classifier, extractor, text, include_raw_scores).await
            }));
        }

        let mut items = Vec::with_capacity(handles.len());
        for handle in handles {
            let item = handle.await.context("analysis task panicked")??;
            items.push(item);
        }

        let batch = BatchResult::from_items(items);
        tracing::debug!(
            count = batch.count,
            failed = batch.summary.failed,
            "batch analyzed"
        );
        Ok(batch)
    }

    /// Single-item entry point. Unlike `run`, any failure propagates.
    pub async fn run_one(
        &self,
        text: &str,
    ) -> anyhow::Result<(SentimentResult, EntityResult, RiskSignal)> {
        let mut sentiment = self.classifier.classify(text).await?;
        if !self.config.include_raw_scores {
            sentiment.scores.clear();
        }
        let entities = self.extractor.extract(text);
        let signal = risk::aggregate(&sentiment, &entities)?;
        Ok((sentiment, entities, signal))
    }
}

async fn analyze_item(
    classifier: Arc<dyn SentimentClassifier>,
    extractor: Arc<EntityExtractor>,
    text: String,
    include_raw_scores: bool,
) -> anyhow::Result<BatchItem> {
    let mut sentiment = match classifier.classify(&text).await {
        Ok(sentiment) => sentiment,
        Err(err) => {
            tracing::warn!(error = %err, "classification failed; recording item-level error");
            let kind = err
                .downcast_ref::<AnalysisError>()
                .map(|e| e.kind)
                .unwrap_or(ErrorKind::Classification);
            return Ok(BatchItem {
                text,
                outcome: ItemOutcome::Error {
                    kind,
                    detail: format!("{err:#}"),
                },
            });
        }
    };

    if !include_raw_scores {
        sentiment.scores.clear();
    }

    let entities = extractor.extract(&text);
    let risk = risk::aggregate(&sentiment, &entities)?;

    Ok(BatchItem {
        text,
        outcome: ItemOutcome::Ok {
            sentiment,
            entities,
            risk,
        },
    })
}
