// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod collectors;
pub mod config;
pub mod enrich;
pub mod ingest;
pub mod llm;
pub mod metrics;
pub mod record;
pub mod sink;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::EnrichConfig;
pub use crate::enrich::{Enricher, Extraction};
pub use crate::record::{Context, EnrichedRecord, EnrichmentResult, GeoLocation, MediaAsset, NewsItem};

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing::info;

use crate::ingest::providers::newsapi::NewsApiProvider;

/// Build the full application from config: router (+ /metrics) and, when
/// ingestion is enabled, the background ingest scheduler.
pub fn app(cfg: &EnrichConfig) -> Result<Router> {
    let http = cfg.http.build_client()?;
    let enricher = Arc::new(Enricher::with_client(cfg, http.clone()));
    let sink = crate::sink::build_sink(&cfg.sink.webhook_url, http.clone());

    if cfg.ingest.enabled {
        let provider = Arc::new(NewsApiProvider::from_config(&cfg.ingest, http));
        crate::ingest::scheduler::spawn_ingest_scheduler(
            provider,
            cfg.ingest.clone(),
            enricher.clone(),
            sink.clone(),
        );
        info!(interval_secs = cfg.ingest.interval_secs, "ingest scheduler started");
    }

    let metrics = crate::metrics::Metrics::init()?;
    let state = crate::api::AppState { enricher, sink };
    Ok(router(state).merge(metrics.router()))
}
