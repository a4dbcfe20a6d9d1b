// src/sink.rs
//! Storage boundary: enriched records are handed to a `RecordSink`.

use anyhow::{Context, Result};
use metrics::counter;
use reqwest::Client;

use crate::enrich::Enricher;
use crate::record::{EnrichedRecord, NewsItem};

#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    async fn store(&self, record: &EnrichedRecord) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// POSTs each record as JSON to the storage service.
pub struct WebhookSink {
    url: String,
    client: Client,
}

impl WebhookSink {
    pub fn new(url: String, client: Client) -> Self {
        Self { url, client }
    }
}

#[async_trait::async_trait]
impl RecordSink for WebhookSink {
    async fn store(&self, record: &EnrichedRecord) -> Result<()> {
        self.client
            .post(&self.url)
            .json(record)
            .send()
            .await
            .context("storage webhook post")?
            .error_for_status()
            .context("storage webhook non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Logs records instead of storing them (no storage configured).
pub struct LogSink;

#[async_trait::async_trait]
impl RecordSink for LogSink {
    async fn store(&self, record: &EnrichedRecord) -> Result<()> {
        tracing::info!(
            target: "sink",
            item = %record.item.log_key(),
            summary = record.summary.as_deref().unwrap_or_default(),
            "enriched record (log sink)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Webhook sink when a URL is configured, log sink otherwise.
pub fn build_sink(webhook_url: &str, client: Client) -> std::sync::Arc<dyn RecordSink> {
    if webhook_url.trim().is_empty() {
        tracing::debug!("storage webhook disabled (no STORAGE_WEBHOOK_URL)");
        std::sync::Arc::new(LogSink)
    } else {
        std::sync::Arc::new(WebhookSink::new(webhook_url.trim().to_string(), client))
    }
}

/// "News created" handler: enrich, then forward only when a record was produced.
/// Returns the record that was forwarded, if any.
pub async fn forward(
    enricher: &Enricher,
    sink: &dyn RecordSink,
    item: &NewsItem,
) -> Option<EnrichedRecord> {
    let record = enricher.enrich(item).await?;
    match sink.store(&record).await {
        Ok(()) => counter!("enrich_forwarded_total").increment(1),
        Err(e) => {
            tracing::warn!(target: "sink", sink = sink.name(), item = %item.log_key(), error = ?e, "storing record failed");
        }
    }
    Some(record)
}
