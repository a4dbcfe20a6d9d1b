// src/enrich/pipeline.rs
//! # Enrichment orchestrator
//! Extract first (it supplies every query), then fan out to the collectors
//! concurrently, join, and assemble.
//!
//! Policy: a collector never aborts the pipeline; each task is bounded by a
//! timeout and reports an absent value or its sentinel string instead. Only a
//! transport failure of the extraction call itself yields no record.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use metrics::{counter, histogram};
use tracing::{debug, error, info, warn};

use crate::collectors::{
    record_miss, social, trend, Geocoder, MediaResolver, SentimentEstimator, SnippetFetcher, Sources,
    TrendEstimator,
};
use crate::config::EnrichConfig;
use crate::enrich::assembler::{assemble, Augmentations};
use crate::enrich::extractor::{Extraction, Extractor};
use crate::llm::DynChatModel;
use crate::record::{EnrichedRecord, EnrichmentResult, GeoLocation, MediaAsset, NewsItem};

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub geocode_delay: Duration,
    pub collector_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(cfg: &EnrichConfig) -> Self {
        Self {
            geocode_delay: cfg.geocode_delay(),
            collector_timeout: cfg.collector_timeout(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            geocode_delay: Duration::from_secs(1),
            collector_timeout: Duration::from_secs(15),
        }
    }
}

pub struct Enricher {
    extractor: Extractor,
    media: MediaResolver,
    snippets: SnippetFetcher,
    geocoder: Geocoder,
    trend: TrendEstimator,
    sentiment: SentimentEstimator,
    geocode_delay: Duration,
    collector_timeout: Duration,
}

impl Enricher {
    pub fn new(
        model: DynChatModel,
        sources: Sources,
        sentiment_language: &str,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor: Extractor::new(model.clone()),
            media: MediaResolver::new(sources.images, sources.videos),
            snippets: SnippetFetcher::new(sources.knowledge),
            geocoder: Geocoder::new(sources.geocoder),
            trend: TrendEstimator::new(sources.search),
            sentiment: SentimentEstimator::new(sources.social, model, sentiment_language),
            geocode_delay: settings.geocode_delay,
            collector_timeout: settings.collector_timeout,
        }
    }

    /// Production wiring: OpenRouter model + HTTP collectors on one shared client.
    pub fn from_config(cfg: &EnrichConfig) -> Result<Self> {
        Ok(Self::with_client(cfg, cfg.http.build_client()?))
    }

    pub fn with_client(cfg: &EnrichConfig, http: reqwest::Client) -> Self {
        let model = crate::llm::build_chat_model(&cfg.model, http.clone());
        let sources = Sources::from_config(cfg, http);
        Self::new(
            model,
            sources,
            &cfg.social.language,
            PipelineSettings::from_config(cfg),
        )
    }

    /// `None` means "nothing to forward downstream"; the reason is only logged.
    pub async fn enrich(&self, item: &NewsItem) -> Option<EnrichedRecord> {
        crate::metrics::ensure_metrics_described();
        counter!("enrich_items_total").increment(1);
        let t0 = Instant::now();

        let out = match self.try_enrich(item).await {
            Ok(record) => Some(record),
            Err(e) => {
                error!(target: "enrich", item = %item.log_key(), error = %e, "enrichment failed");
                counter!("enrich_failures_total").increment(1);
                None
            }
        };

        histogram!("enrich_pipeline_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }

    /// Like `enrich`, but surfaces the fatal extraction error.
    pub async fn try_enrich(&self, item: &NewsItem) -> Result<EnrichedRecord> {
        let extraction = self.extractor.extract(item).await?;
        counter!("enrich_extraction_total", "outcome" => extraction.outcome()).increment(1);

        let key = item.log_key();
        if matches!(extraction, Extraction::Empty) {
            warn!(target: "enrich", item = %key, "continuing with baseline record");
        }

        let result = extraction.into_result();
        let augmentations = self.collect(item, &result).await;

        let record = assemble(item, &result, augmentations);
        info!(
            target: "enrich",
            item = %key,
            has_summary = record.summary.is_some(),
            has_media = record.media.is_some(),
            context_fields = record.context.as_ref().map(|c| c.len()).unwrap_or(0),
            "item enriched"
        );
        Ok(record)
    }

    /// Fan out to the requested collectors and join. Tasks share no state.
    async fn collect(&self, item: &NewsItem, hints: &EnrichmentResult) -> Augmentations {
        let (media, wikipedia_snippet, geo, search_trend, social_sentiment) = tokio::join!(
            self.media_task(item, hints),
            self.bounded("wikipedia", hints.wikipedia_search_term.as_deref(), |term| {
                self.snippets.fetch_snippet(term)
            }),
            self.bounded("geocode", hints.location.as_deref(), |loc| self.geocode_task(loc)),
            self.bounded_text(
                "trend",
                hints.search_trend_query.as_deref(),
                |q| self.trend.estimate(q),
                trend::unavailable_message,
            ),
            self.bounded_text(
                "sentiment",
                hints.social_sentiment_query.as_deref(),
                |t| self.sentiment.estimate(t),
                |_| social::UNAVAILABLE_MESSAGE.to_string(),
            ),
        );

        Augmentations {
            media,
            wikipedia_snippet,
            geo,
            search_trend,
            social_sentiment,
        }
    }

    /// Media is requested by a justification; the search subject falls back to the title.
    async fn media_task(&self, item: &NewsItem, hints: &EnrichmentResult) -> Option<MediaAsset> {
        let justification = hints.media_justification.as_deref()?;
        let query = hints.media_query.as_deref().unwrap_or(item.title.as_str());
        self.bounded("media", Some(query), |q| self.media.resolve(q, justification))
            .await
    }

    /// The provider's fixed delay runs inside this pipeline only; concurrent
    /// items never queue behind each other.
    async fn geocode_task(&self, location: &str) -> Option<GeoLocation> {
        tokio::time::sleep(self.geocode_delay).await;
        self.geocoder.geocode(location).await
    }

    /// Run `f` only when `input` is present, bounded by the collector timeout.
    async fn bounded<'a, T, F, Fut>(
        &self,
        collector: &'static str,
        input: Option<&'a str>,
        f: F,
    ) -> Option<T>
    where
        F: FnOnce(&'a str) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let input = input?;
        debug!(target: "enrich", collector, "collector started");
        match tokio::time::timeout(self.collector_timeout, f(input)).await {
            Ok(v) => v,
            Err(_) => {
                warn!(target: "enrich", collector, timeout_ms = self.collector_timeout.as_millis() as u64, "collector timed out");
                record_miss(collector);
                None
            }
        }
    }

    /// Same as `bounded` for the estimators, which always produce a string.
    async fn bounded_text<'a, F, Fut, U>(
        &self,
        collector: &'static str,
        input: Option<&'a str>,
        f: F,
        on_timeout: U,
    ) -> Option<String>
    where
        F: FnOnce(&'a str) -> Fut,
        Fut: Future<Output = String>,
        U: FnOnce(&str) -> String,
    {
        let input = input?;
        debug!(target: "enrich", collector, "collector started");
        match tokio::time::timeout(self.collector_timeout, f(input)).await {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(target: "enrich", collector, timeout_ms = self.collector_timeout.as_millis() as u64, "collector timed out");
                record_miss(collector);
                Some(on_timeout(input))
            }
        }
    }
}
