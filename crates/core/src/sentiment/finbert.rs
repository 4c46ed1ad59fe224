//! Model-backed classifier: HTTP adapter to a FinBERT-style inference
//! service. The model itself is an external collaborator; only the wire
//! contract lives here. The service takes one headline and returns a
//! three-class score distribution.

use crate::config::Settings;
use crate::domain::sentiment::{SentimentLabel, SentimentResult};
use crate::error::AnalysisError;
use crate::sentiment::SentimentClassifier;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

const DEFAULT_MODEL: &str = "finbert-tone";
const DEFAULT_PATH: &str = "/v1/sentiment";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct FinbertClassifier {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    model: String,
    retries: u32,
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    scores: BTreeMap<String, f64>,
}

impl FinbertClassifier {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_sentiment_api_base_url()?.to_string();
        let api_key = settings.sentiment_api_key.clone();

        let timeout_secs = std::env::var("SENTIMENT_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("SENTIMENT_API_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("SENTIMENT_API_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let model =
            std::env::var("SENTIMENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build sentiment http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            model,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn classify_once(&self, text: &str) -> anyhow::Result<ClassifyResponse> {
        let res = self
            .http
            .post(self.url())
            .headers(self.headers()?)
            .json(&ClassifyRequest {
                model: &self.model,
                text,
            })
            .send()
            .await
            .context("sentiment inference request failed")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("failed to read inference response body")?;
        if !status.is_success() {
            anyhow::bail!("sentiment inference HTTP {status}: {body}");
        }

        serde_json::from_str::<ClassifyResponse>(&body)
            .with_context(|| format!("inference response is not valid JSON: {body}"))
    }
}

#[async_trait::async_trait]
impl SentimentClassifier for FinbertClassifier {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn classify(&self, text: &str) -> anyhow::Result<SentimentResult> {
        if text.trim().is_empty() {
            return Err(AnalysisError::classification("finbert", "empty input text").into());
        }

        let started = Instant::now();
        let mut attempt: u32 = 0;
        let response = loop {
            attempt += 1;
            match self.classify_once(text).await {
                Ok(res) => break res,
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = backoff_delay(attempt);
                    tracing::warn!(attempt, ?backoff, error = %err, "inference call failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        into_result(text, &self.model, latency_ms, response)
    }
}

/// Exponential backoff, capped so a large retry setting cannot overflow
/// the shift or stall a batch for hours.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << (attempt - 1).min(6))
}

/// Validates the wire response and derives label/confidence by argmax.
fn into_result(
    text: &str,
    model: &str,
    latency_ms: f64,
    response: ClassifyResponse,
) -> anyhow::Result<SentimentResult> {
    let mut scores = BTreeMap::new();
    for (key, score) in response.scores {
        let label = match key.to_lowercase().as_str() {
            "positive" => SentimentLabel::Positive,
            "neutral" => SentimentLabel::Neutral,
            "negative" => SentimentLabel::Negative,
            other => {
                return Err(AnalysisError::classification(
                    "finbert",
                    format!("unknown class label in inference response: {other}"),
                )
                .into())
            }
        };
        anyhow::ensure!(
            (0.0..=1.0).contains(&score),
            "inference score for {label} out of range: {score}"
        );
        scores.insert(label, score);
    }
    anyhow::ensure!(
        scores.len() == 3,
        "inference response must score all 3 classes (got {})",
        scores.len()
    );

    // Argmax; BTreeMap iteration order makes ties deterministic.
    let (label, confidence) = scores
        .iter()
        .fold((SentimentLabel::Neutral, f64::MIN), |best, (l, s)| {
            if *s > best.1 {
                (*l, *s)
            } else {
                best
            }
        });

    Ok(SentimentResult {
        text: text.to_string(),
        label,
        confidence,
        scores,
        model: model.to_string(),
        latency_ms,
    })
}
