use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsignal_core::pipeline::{Pipeline, PipelineConfig};

mod report;

#[derive(Debug, Parser)]
#[command(name = "finsignal_worker")]
struct Args {
    /// Analyze a single custom headline instead of a dataset.
    #[arg(long)]
    text: Option<String>,

    /// Fetch live headlines from RSS feeds.
    #[arg(long)]
    rss: bool,

    /// Run on the first 5 sample headlines (fast demo).
    #[arg(long)]
    quick: bool,

    /// Output raw JSON instead of the formatted report.
    #[arg(long)]
    json: bool,

    /// Use the lexicon fallback instead of the model backend.
    #[arg(long)]
    no_model: bool,

    /// Drop per-class sentiment scores from the output.
    #[arg(long)]
    no_raw_scores: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = finsignal_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let config = PipelineConfig {
        use_model_backend: !args.no_model,
        include_raw_scores: !args.no_raw_scores,
    };
    let pipeline = Pipeline::from_settings(config, &settings)?;

    let texts = resolve_texts(&args, &settings).await?;
    tracing::info!(
        count = texts.len(),
        model = pipeline.model_name(),
        "analyzing headlines"
    );

    let batch = pipeline.run(&texts).await;

    let batch = match batch {
        Ok(batch) => batch,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "analysis run failed");
            return Err(err);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        report::print_report(&batch, pipeline.model_name());
    }

    let alerting = batch.summary.risk.elevated + batch.summary.risk.high;
    if alerting > 0 {
        tracing::warn!(alerting, "elevated/high risk signals detected");
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

async fn resolve_texts(
    args: &Args,
    settings: &finsignal_core::config::Settings,
) -> anyhow::Result<Vec<String>> {
    if let Some(text) = &args.text {
        return Ok(vec![text.clone()]);
    }

    if args.rss {
        let http = reqwest_client()?;
        let urls = settings.feed_urls().unwrap_or_else(|| {
            finsignal_core::ingest::DEFAULT_FEEDS
                .iter()
                .map(|s| s.to_string())
                .collect()
        });
        let headlines = finsignal_core::ingest::fetch_rss_headlines(&http, &urls).await;
        if !headlines.is_empty() {
            return Ok(headlines.into_iter().map(|h| h.text).collect());
        }
        tracing::warn!("no rss headlines fetched; falling back to sample data");
    }

    let headlines = finsignal_core::ingest::sample_headlines()?;
    let headlines = if args.quick {
        headlines.into_iter().take(5).collect()
    } else {
        headlines
    };
    Ok(headlines.into_iter().map(|h| h.text).collect())
}

fn reqwest_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .context("failed to build rss http client")
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
