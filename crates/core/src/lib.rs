pub mod domain;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod pipeline;
pub mod risk;
pub mod sentiment;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentiment_api_base_url: Option<String>,
        pub sentiment_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub rss_feed_urls: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentiment_api_base_url: std::env::var("SENTIMENT_API_BASE_URL").ok(),
                sentiment_api_key: std::env::var("SENTIMENT_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                rss_feed_urls: std::env::var("RSS_FEED_URLS").ok(),
            })
        }

        pub fn require_sentiment_api_base_url(&self) -> anyhow::Result<&str> {
            self.sentiment_api_base_url
                .as_deref()
                .context("SENTIMENT_API_BASE_URL is required")
        }

        /// Comma-separated feed URL overrides, if configured.
        pub fn feed_urls(&self) -> Option<Vec<String>> {
            let raw = self.rss_feed_urls.as_deref()?;
            let urls: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if urls.is_empty() {
                None
            } else {
                Some(urls)
            }
        }
    }
}
