use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsignal_core::domain::analysis::{BatchItem, BatchResult, BatchSummary, ItemOutcome};
use finsignal_core::domain::entities::{Directional, EntityResult};
use finsignal_core::domain::risk::{RiskLevel, RiskSignal};
use finsignal_core::domain::sentiment::{SentimentLabel, SentimentResult};
use finsignal_core::error::ErrorKind;
use finsignal_core::pipeline::{Pipeline, PipelineConfig};

const MAX_BATCH_TEXTS: usize = 50;
const MAX_TEXT_CHARS: usize = 1000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsignal_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let config = PipelineConfig {
        use_model_backend: env_flag("USE_MODEL_BACKEND", true),
        include_raw_scores: env_flag("INCLUDE_RAW_SCORES", true),
    };

    let mut degraded = false;
    let pipeline = match Pipeline::from_settings(config.clone(), &settings) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "model backend unavailable; starting API in degraded mode with lexicon backend");
            degraded = true;
            Pipeline::from_settings(
                PipelineConfig {
                    use_model_backend: false,
                    ..config
                },
                &settings,
            )?
        }
    };

    if degraded {
        tracing::warn!(
            model = pipeline.model_name(),
            "pipeline ready in DEGRADED mode; check SENTIMENT_API_BASE_URL"
        );
    } else {
        tracing::info!(model = pipeline.model_name(), "pipeline ready");
    }

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/analyze", post(analyze))
        .route("/analyze/batch", post(analyze))
        .route("/sample", get(sample))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    texts: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    count: usize,
    processing_time_ms: f64,
    summary: BatchSummary,
    results: Vec<ItemDto>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    let texts = validate_texts(request.texts).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    run_batch(&state, &texts).await
}

/// Runs analysis on the bundled sample headlines. No input required.
async fn sample(State(state): State<AppState>) -> Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    let headlines = finsignal_core::ingest::sample_headlines().map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "sample data unavailable".to_string(),
        )
    })?;
    let texts: Vec<String> = headlines.into_iter().map(|h| h.text).collect();
    run_batch(&state, &texts).await
}

async fn run_batch(
    state: &AppState,
    texts: &[String],
) -> Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    let started = Instant::now();
    let batch = state.pipeline.run(texts).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "pipeline run failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "pipeline error".to_string(),
        )
    })?;
    let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    Ok(Json(into_response(batch, processing_time_ms)))
}

fn validate_texts(texts: Vec<String>) -> Result<Vec<String>, String> {
    if texts.is_empty() || texts.len() > MAX_BATCH_TEXTS {
        return Err(format!(
            "texts must contain between 1 and {MAX_BATCH_TEXTS} items (got {})",
            texts.len()
        ));
    }
    let mut out = Vec::with_capacity(texts.len());
    for (i, text) in texts.into_iter().enumerate() {
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            return Err(format!("texts[{i}] is empty"));
        }
        if trimmed.chars().count() > MAX_TEXT_CHARS {
            return Err(format!("texts[{i}] exceeds {MAX_TEXT_CHARS} characters"));
        }
        out.push(trimmed);
    }
    Ok(out)
}

// ---- response DTOs -------------------------------------------------------
//
// Field names and nesting are the consumer contract: report generators and
// HTTP clients read these without further computation. Floats are rounded
// here, never in the domain layer, so level-from-score stays exact.

#[derive(Debug, Serialize)]
struct ItemDto {
    text: String,
    #[serde(flatten)]
    outcome: OutcomeDto,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum OutcomeDto {
    Ok {
        sentiment: SentimentDto,
        entities: EntityDto,
        risk: RiskDto,
    },
    Error {
        kind: ErrorKind,
        detail: String,
    },
}

#[derive(Debug, Serialize)]
struct SentimentDto {
    label: SentimentLabel,
    confidence: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    scores: BTreeMap<SentimentLabel, f64>,
    is_risk_signal: bool,
    model: String,
    latency_ms: f64,
}

#[derive(Debug, Serialize)]
struct EntityDto {
    institutions: Vec<String>,
    metrics: Vec<String>,
    numerics: Vec<String>,
    directional: Directional,
}

#[derive(Debug, Serialize)]
struct RiskDto {
    risk_score: f64,
    risk_level: RiskLevel,
    components: ComponentsDto,
    recommendation: String,
}

#[derive(Debug, Serialize)]
struct ComponentsDto {
    sentiment_direction: f64,
    entity_multiplier: f64,
    alignment_bonus: f64,
    raw_score: f64,
}

fn into_response(batch: BatchResult, processing_time_ms: f64) -> AnalyzeResponse {
    AnalyzeResponse {
        count: batch.count,
        processing_time_ms: round1(processing_time_ms),
        summary: batch.summary,
        results: batch.items.into_iter().map(into_item_dto).collect(),
    }
}

fn into_item_dto(item: BatchItem) -> ItemDto {
    let outcome = match item.outcome {
        ItemOutcome::Ok {
            sentiment,
            entities,
            risk,
        } => OutcomeDto::Ok {
            sentiment: into_sentiment_dto(sentiment),
            entities: into_entity_dto(entities),
            risk: into_risk_dto(risk),
        },
        ItemOutcome::Error { kind, detail } => OutcomeDto::Error { kind, detail },
    };
    ItemDto {
        text: item.text,
        outcome,
    }
}

fn into_sentiment_dto(sentiment: SentimentResult) -> SentimentDto {
    let is_risk_signal = sentiment.is_risk_signal();
    SentimentDto {
        label: sentiment.label,
        confidence: round4(sentiment.confidence),
        scores: sentiment
            .scores
            .into_iter()
            .map(|(label, score)| (label, round4(score)))
            .collect(),
        is_risk_signal,
        model: sentiment.model,
        latency_ms: round1(sentiment.latency_ms),
    }
}

fn into_entity_dto(entities: EntityResult) -> EntityDto {
    EntityDto {
        institutions: entities.institutions.into_iter().collect(),
        metrics: entities.metrics.into_iter().collect(),
        numerics: entities.numerics,
        directional: entities.directional,
    }
}

fn into_risk_dto(risk: RiskSignal) -> RiskDto {
    RiskDto {
        risk_score: round4(risk.risk_score),
        risk_level: risk.risk_level,
        components: ComponentsDto {
            sentiment_direction: round4(risk.components.sentiment_direction),
            entity_multiplier: round4(risk.components.entity_multiplier),
            alignment_bonus: round4(risk.components.alignment_bonus),
            raw_score: round4(risk.components.raw_score),
        },
        recommendation: risk.recommendation,
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &finsignal_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsignal_core::domain::risk::ScoreComponents;

    fn ok_batch_item() -> BatchItem {
        let mut scores = BTreeMap::new();
        scores.insert(SentimentLabel::Negative, 0.94);
        BatchItem {
            text: "Moody's downgrades regional banks".to_string(),
            outcome: ItemOutcome::Ok {
                sentiment: SentimentResult {
                    text: "Moody's downgrades regional banks".to_string(),
                    label: SentimentLabel::Negative,
                    confidence: 0.94,
                    scores,
                    model: "finbert-tone".to_string(),
                    latency_ms: 12.34,
                },
                entities: EntityResult {
                    institutions: ["Moody's".to_string()].into_iter().collect(),
                    metrics: ["non_performing_loans".to_string()].into_iter().collect(),
                    numerics: Vec::new(),
                    directional: Directional::Bearish,
                },
                risk: RiskSignal {
                    risk_score: 1.0,
                    risk_level: RiskLevel::High,
                    components: ScoreComponents {
                        sentiment_direction: 0.94,
                        entity_multiplier: 1.2,
                        alignment_bonus: 0.1,
                        raw_score: 1.228,
                    },
                    recommendation: "Escalate".to_string(),
                },
            },
        }
    }

    #[test]
    fn item_dto_keeps_the_consumer_field_layout() {
        let v = serde_json::to_value(into_item_dto(ok_batch_item())).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["text"], "Moody's downgrades regional banks");
        assert_eq!(v["sentiment"]["label"], "negative");
        assert_eq!(v["sentiment"]["confidence"], 0.94);
        assert_eq!(v["sentiment"]["is_risk_signal"], true);
        assert_eq!(v["sentiment"]["model"], "finbert-tone");
        assert_eq!(v["entities"]["institutions"][0], "Moody's");
        assert_eq!(v["entities"]["directional"], "bearish");
        assert_eq!(v["risk"]["risk_score"], 1.0);
        assert_eq!(v["risk"]["risk_level"], "high");
        assert_eq!(v["risk"]["components"]["entity_multiplier"], 1.2);
        assert_eq!(v["risk"]["recommendation"], "Escalate");
    }

    #[test]
    fn error_items_carry_the_status_tag_and_kind() {
        let item = BatchItem {
            text: "bad".to_string(),
            outcome: ItemOutcome::Error {
                kind: ErrorKind::Classification,
                detail: "inference unreachable".to_string(),
            },
        };
        let v = serde_json::to_value(into_item_dto(item)).unwrap();
        assert_eq!(v["status"], "error");
        assert_eq!(v["kind"], "classification");
        assert_eq!(v["detail"], "inference unreachable");
        assert!(v.get("risk").is_none());
    }

    #[test]
    fn empty_score_maps_are_omitted_from_the_wire() {
        let mut item = ok_batch_item();
        if let ItemOutcome::Ok { sentiment, .. } = &mut item.outcome {
            sentiment.scores.clear();
        }
        let v = serde_json::to_value(into_item_dto(item)).unwrap();
        assert!(v["sentiment"].get("scores").is_none());
    }

    #[test]
    fn validate_texts_trims_and_accepts_small_batches() {
        let out = validate_texts(vec!["  hello  ".to_string()]).unwrap();
        assert_eq!(out, vec!["hello"]);
    }

    #[test]
    fn validate_texts_rejects_empty_batch_and_empty_items() {
        assert!(validate_texts(vec![]).is_err());
        assert!(validate_texts(vec!["   ".to_string()]).is_err());
    }

    #[test]
    fn validate_texts_rejects_oversize_batch_and_items() {
        let big = vec!["x".to_string(); MAX_BATCH_TEXTS + 1];
        assert!(validate_texts(big).is_err());
        let long = "y".repeat(MAX_TEXT_CHARS + 1);
        assert!(validate_texts(vec![long]).is_err());
    }

    #[test]
    fn rounding_is_dto_only() {
        assert_eq!(round4(1.2284512), 1.2285);
        assert_eq!(round4(0.94), 0.94);
        assert_eq!(round1(123.44), 123.4);
    }
}
