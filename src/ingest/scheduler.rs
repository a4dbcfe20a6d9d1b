// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::enrich::IngestConfig;
use crate::enrich::Enricher;
use crate::ingest::types::NewsProvider;
use crate::sink::{forward, RecordSink};

/// Run one ingest → enrich → forward cycle. Items are enriched concurrently,
/// one task each. Returns how many records were produced.
pub async fn run_cycle(
    provider: &dyn NewsProvider,
    cfg: &IngestConfig,
    enricher: Arc<Enricher>,
    sink: Arc<dyn RecordSink>,
) -> usize {
    let items = crate::ingest::run_once(provider, cfg).await;

    let mut tasks = JoinSet::new();
    for item in items {
        let enricher = enricher.clone();
        let sink = sink.clone();
        tasks.spawn(async move { forward(&enricher, sink.as_ref(), &item).await.is_some() });
    }

    let mut produced = 0usize;
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(true) => produced += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(target: "ingest", error = %e, "enrichment task panicked"),
        }
    }
    produced
}

/// Spawn the periodic ingest loop. The first tick fires immediately.
pub fn spawn_ingest_scheduler(
    provider: Arc<dyn NewsProvider>,
    cfg: IngestConfig,
    enricher: Arc<Enricher>,
    sink: Arc<dyn RecordSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(cfg.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let produced = run_cycle(provider.as_ref(), &cfg, enricher.clone(), sink.clone()).await;
            counter!("ingest_runs_total").increment(1);
            tracing::info!(target: "ingest", produced, "ingest tick");
        }
    })
}
