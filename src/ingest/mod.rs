// src/ingest/mod.rs
//! News ingestion: fetch from a provider, normalize, keep items with enough body text.

pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, SecondsFormat, Utc};
use metrics::counter;

use crate::config::enrich::IngestConfig;
use crate::ingest::types::NewsProvider;
use crate::record::NewsItem;
use crate::text::normalize_article_text;

/// Body length cap after normalization.
pub const MAX_BODY_CHARS: usize = 10_000;

/// Take the first `limit` items, normalize title/body, drop short bodies, stamp ingest time.
/// Returns (kept, filtered_count).
pub fn prepare_items(
    raw: Vec<NewsItem>,
    limit: usize,
    min_body_chars: usize,
    now: DateTime<Utc>,
) -> (Vec<NewsItem>, usize) {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut filtered_out = 0usize;
    let mut keep = Vec::with_capacity(limit.min(raw.len()));

    for mut item in raw.into_iter().take(limit) {
        item.title = normalize_article_text(&item.title, 500);
        item.body = normalize_article_text(&item.body, MAX_BODY_CHARS);
        if item.title.is_empty() || item.body.chars().count() < min_body_chars {
            filtered_out += 1;
            continue;
        }
        item.ingested_at = Some(stamp.clone());
        keep.push(item);
    }
    (keep, filtered_out)
}

/// Run ingest once against one provider. Provider errors are logged and yield nothing.
pub async fn run_once(provider: &dyn NewsProvider, cfg: &IngestConfig) -> Vec<NewsItem> {
    crate::metrics::ensure_metrics_described();

    let raw = match provider.fetch_latest().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "ingest", error = ?e, provider = provider.name(), "provider error");
            counter!("ingest_provider_errors_total").increment(1);
            return Vec::new();
        }
    };

    let (kept, filtered) = prepare_items(raw, cfg.limit, cfg.min_body_chars, Utc::now());
    counter!("ingest_items_total").increment(kept.len() as u64);
    tracing::info!(target: "ingest", kept = kept.len(), filtered, provider = provider.name(), "ingest run");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(title: &str, body: &str) -> NewsItem {
        NewsItem {
            id: None,
            title: title.into(),
            body: body.into(),
            source_url: format!("https://example.test/{title}"),
            publisher: "Example".into(),
            published_at: "2025-01-01T00:00:00Z".into(),
            ingested_at: None,
        }
    }

    #[test]
    fn limit_applies_before_filter() {
        let long = "x".repeat(250);
        let items = vec![
            raw("a", "short"),
            raw("b", &long),
            raw("c", &long),
            raw("d", &long),
        ];
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let (kept, filtered) = prepare_items(items, 3, 200, now);
        assert_eq!(kept.len(), 2);
        assert_eq!(filtered, 1);
        assert_eq!(kept[0].title, "b");
        assert_eq!(kept[0].ingested_at.as_deref(), Some("2025-03-01T12:00:00Z"));
    }

    #[test]
    fn body_is_normalized_before_length_check() {
        let padded = format!("<p>{}</p>{}", "y".repeat(150), " ".repeat(100));
        let now = Utc::now();
        let (kept, filtered) = prepare_items(vec![raw("t", &padded)], 5, 200, now);
        assert!(kept.is_empty());
        assert_eq!(filtered, 1);
    }
}
