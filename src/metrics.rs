use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init() -> Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| {
                PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")
            })?
            .clone();
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metric descriptions (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("enrich_items_total", "News items entering the enrichment pipeline.");
        describe_counter!(
            "enrich_extraction_total",
            "Extraction outcomes by kind (valid, repaired, empty)."
        );
        describe_counter!(
            "enrich_collector_misses_total",
            "Augmentations that failed, timed out, or found nothing."
        );
        describe_counter!(
            "enrich_failures_total",
            "Pipelines aborted by a fatal extraction error."
        );
        describe_counter!("enrich_forwarded_total", "Records handed to the storage sink.");
        describe_counter!("ingest_items_total", "Items kept by the ingest filter.");
        describe_counter!("ingest_provider_errors_total", "News provider fetch/parse errors.");
        describe_counter!("ingest_events_total", "Raw articles returned by the news provider.");
        describe_counter!("ingest_runs_total", "Completed scheduler ticks.");
        describe_histogram!("enrich_pipeline_ms", "End-to-end enrichment time in milliseconds.");
    });
}
