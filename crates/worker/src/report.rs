//! Formatted stdout report for a batch analysis.

use finsignal_core::domain::analysis::BatchResult;

const TOP_RISKS: usize = 5;
const MAX_POSITIVE_SHOWN: usize = 3;

pub fn print_report(batch: &BatchResult, model: &str) {
    let rule = "=".repeat(80);
    let thin = "-".repeat(80);

    println!("\n{rule}");
    println!("FINANCIAL SENTIMENT & RISK ANALYSIS REPORT");
    println!("{rule}");

    println!("\nHeadlines analyzed: {}", batch.count);
    if batch.summary.failed > 0 {
        println!("Failed items: {}", batch.summary.failed);
    }
    let s = batch.summary.sentiment;
    println!(
        "Sentiment: {} positive | {} neutral | {} negative",
        s.positive, s.neutral, s.negative
    );
    let r = batch.summary.risk;
    println!(
        "Risk distribution: {} low | {} medium | {} elevated | {} high",
        r.low, r.medium, r.elevated, r.high
    );

    let mut by_risk: Vec<_> = batch.successes().collect();
    by_risk.sort_by(|a, b| {
        b.3.risk_score
            .partial_cmp(&a.3.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!("\n{thin}");
    println!("TOP {TOP_RISKS} RISK SIGNALS");
    println!("{thin}");
    for (i, (text, sentiment, entities, risk)) in by_risk.iter().take(TOP_RISKS).enumerate() {
        println!(
            "\n{}. [{:8}] Score: {:.3}",
            i + 1,
            risk.risk_level.as_str().to_uppercase(),
            risk.risk_score
        );
        println!("   {}", truncate(text, 78));
        println!(
            "   Sentiment: {} ({:.0}% confidence) | Directional: {}",
            sentiment.label,
            sentiment.confidence * 100.0,
            entities.directional
        );
        if !entities.institutions.is_empty() {
            let names: Vec<&str> = entities
                .institutions
                .iter()
                .take(3)
                .map(String::as_str)
                .collect();
            println!("   Institutions: {}", names.join(", "));
        }
        if !entities.metrics.is_empty() {
            let names: Vec<&str> = entities.metrics.iter().take(4).map(String::as_str).collect();
            println!("   Metrics: {}", names.join(", "));
        }
        println!("   -> {}", risk.recommendation);
    }

    let positive: Vec<_> = batch
        .successes()
        .filter(|(_, sentiment, _, _)| {
            sentiment.label == finsignal_core::domain::sentiment::SentimentLabel::Positive
        })
        .collect();
    if !positive.is_empty() {
        println!("\n{thin}");
        println!("POSITIVE MARKET SIGNALS ({})", positive.len());
        println!("{thin}");
        for (text, sentiment, _, risk) in positive.iter().take(MAX_POSITIVE_SHOWN) {
            println!("  + {}", truncate(text, 75));
            println!(
                "    Confidence: {:.0}% | {}",
                sentiment.confidence * 100.0,
                risk.recommendation
            );
        }
    }

    println!("\n{thin}");
    println!("Model: {model}");
    let latencies: Vec<f64> = batch
        .successes()
        .map(|(_, sentiment, _, _)| sentiment.latency_ms)
        .collect();
    if !latencies.is_empty() {
        let avg = latencies.iter().sum::<f64>() / latencies.len() as f64;
        println!("Avg latency: {avg:.1}ms per headline");
    }
    println!("{rule}\n");
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
        assert_eq!(truncate("héllo wörld", 5), "héllo…");
    }
}
