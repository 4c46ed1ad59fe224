//! Headline acquisition: bundled samples, ad-hoc text, and RSS feeds.
//! Feeds are best-effort; callers fall back to the bundled set when a fetch
//! yields nothing.

use crate::domain::sentiment::SentimentLabel;
use anyhow::Context;
use chrono::NaiveDate;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEEDS: &[&str] = &[
    "https://feeds.reuters.com/reuters/businessNews",
    "https://www.ft.com/?format=rss",
];

const MAX_PER_FEED: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub text: String,
    pub source: String,
    pub date: NaiveDate,
    /// Ground-truth sentiment when known (labeled corpora only).
    pub label: Option<SentimentLabel>,
}

/// Curated sample headlines covering real financial language patterns.
/// No network required.
const SAMPLE_HEADLINES: &[(&str, &str, &str)] = &[
    (
        "Goldman Sachs beats Q3 earnings expectations by 15%, raises full-year guidance",
        "Reuters",
        "2024-10-15",
    ),
    (
        "ECB signals end of rate hiking cycle as inflation approaches 2% target",
        "FT",
        "2024-10-14",
    ),
    (
        "JPMorgan reports record investment banking fees on resurgent M&A activity",
        "Bloomberg",
        "2024-10-13",
    ),
    (
        "Visa card payment volumes surge 12% YoY driven by travel and e-commerce recovery",
        "Reuters",
        "2024-10-12",
    ),
    (
        "European banks capital ratios strengthen as loan loss provisions normalize",
        "FT",
        "2024-10-11",
    ),
    (
        "BlackRock AUM hits $10 trillion milestone as investors return to equity markets",
        "Bloomberg",
        "2024-10-10",
    ),
    (
        "Santander consumer credit portfolio quality improves across all European markets",
        "Reuters",
        "2024-10-09",
    ),
    (
        "Credit Suisse faces potential $2bn writedown on leveraged loan exposure",
        "Bloomberg",
        "2024-10-08",
    ),
    (
        "Deutsche Bank warns of rising NPL ratios as commercial real estate defaults mount",
        "FT",
        "2024-10-07",
    ),
    (
        "Fed signals rates higher for longer, triggering selloff in rate-sensitive financials",
        "Reuters",
        "2024-10-06",
    ),
    (
        "Regional US banks report surge in deposit outflows amid confidence crisis",
        "Bloomberg",
        "2024-10-05",
    ),
    (
        "HSBC profit warning issued as Asia operations face headwinds from China slowdown",
        "FT",
        "2024-10-04",
    ),
    (
        "BNP Paribas trading revenues collapse 23% on adverse fixed income conditions",
        "Reuters",
        "2024-10-03",
    ),
    (
        "Moody's downgrades 10 US regional banks citing commercial real estate concentration risk",
        "Bloomberg",
        "2024-10-02",
    ),
    (
        "Bank of England holds rates steady, maintains data-dependent forward guidance",
        "Reuters",
        "2024-10-01",
    ),
    (
        "Basel IV implementation timeline extended to 2026 pending final calibration",
        "FT",
        "2024-09-30",
    ),
    (
        "ING Group announces strategic review of retail banking operations in Germany",
        "Bloomberg",
        "2024-09-29",
    ),
    (
        "Citigroup restructuring enters final phase with 7,000 roles eliminated to date",
        "Reuters",
        "2024-09-28",
    ),
    (
        "SWIFT announces expansion of ISO 20022 migration deadline to March 2025",
        "FT",
        "2024-09-27",
    ),
    (
        "European Central Bank maintains asset purchase programme at current pace",
        "Bloomberg",
        "2024-09-26",
    ),
];

pub fn sample_headlines() -> anyhow::Result<Vec<Headline>> {
    SAMPLE_HEADLINES
        .iter()
        .map(|(text, source, date)| {
            Ok(Headline {
                text: text.to_string(),
                source: source.to_string(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .with_context(|| format!("invalid sample date {date}"))?,
                label: None,
            })
        })
        .collect()
}

/// Wraps raw strings as headlines for ad-hoc analysis.
pub fn custom_headlines(texts: &[String]) -> Vec<Headline> {
    let today = chrono::Utc::now().date_naive();
    texts
        .iter()
        .map(|text| Headline {
            text: text.clone(),
            source: "user_input".to_string(),
            date: today,
            label: None,
        })
        .collect()
}

/// Fetches item titles from RSS feeds. Unreachable or malformed feeds are
/// logged and skipped; an overall empty result means the caller should fall
/// back to the sample set.
pub async fn fetch_rss_headlines(
    http: &reqwest::Client,
    feed_urls: &[String],
) -> Vec<Headline> {
    let today = chrono::Utc::now().date_naive();
    let mut headlines = Vec::new();

    for url in feed_urls {
        let body = match fetch_feed(http, url).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "rss fetch failed; skipping feed");
                continue;
            }
        };
        for title in extract_titles(&body).into_iter().take(MAX_PER_FEED) {
            headlines.push(Headline {
                text: title,
                source: url.clone(),
                date: today,
                label: None,
            });
        }
    }

    headlines
}

async fn fetch_feed(http: &reqwest::Client, url: &str) -> anyhow::Result<String> {
    let res = http
        .get(url)
        .send()
        .await
        .context("rss request failed")?;
    let status = res.status();
    anyhow::ensure!(status.is_success(), "rss feed HTTP {status}");
    res.text().await.context("failed to read rss body")
}

/// Pulls item titles out of an RSS/Atom body. The first title in a feed is
/// the channel's own name and is skipped.
fn extract_titles(body: &str) -> Vec<String> {
    let Ok(re) = RegexBuilder::new(r"<title>(?:\s*<!\[CDATA\[)?(.*?)(?:\]\]>\s*)?</title>")
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
    else {
        return Vec::new();
    };

    re.captures_iter(body)
        .skip(1)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_headlines_parse_and_keep_curation_order() {
        let headlines = sample_headlines().unwrap();
        assert_eq!(headlines.len(), 20);
        assert!(headlines[0].text.starts_with("Goldman Sachs"));
        assert_eq!(headlines[0].source, "Reuters");
        assert_eq!(
            headlines[0].date,
            NaiveDate::from_ymd_opt(2024, 10, 15).unwrap()
        );
    }

    #[test]
    fn custom_headlines_wrap_raw_text() {
        let headlines = custom_headlines(&["one".to_string(), "two".to_string()]);
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].text, "one");
        assert_eq!(headlines[0].source, "user_input");
    }

    #[test]
    fn titles_are_extracted_and_channel_title_skipped() {
        let body = r#"<rss><channel>
            <title>Example Business News</title>
            <item><title>First headline</title></item>
            <item><title><![CDATA[Second headline]]></title></item>
            <item><title>   </title></item>
        </channel></rss>"#;
        let titles = extract_titles(body);
        assert_eq!(titles, vec!["First headline", "Second headline"]);
    }

    #[test]
    fn malformed_body_yields_no_titles() {
        assert!(extract_titles("not xml at all").is_empty());
    }
}
