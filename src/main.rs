//! News enricher binary entrypoint.
//! Loads config, wires the enrichment pipeline, optional ingest scheduler,
//! storage sink and the Axum router.

use news_enricher::EnrichConfig;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON when LOG_FORMAT=json. Filter via RUST_LOG.
/// No-op if the runtime already installed a subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_enricher=info,enrich=info,ingest=info,sink=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = EnrichConfig::load_default()?;
    tracing::info!(
        model = %cfg.model.model,
        model_key_len = cfg.model.api_key.len(),
        ingest = cfg.ingest.enabled,
        webhook = !cfg.sink.webhook_url.is_empty(),
        "config loaded"
    );

    let router = news_enricher::app(&cfg)?;
    Ok(router.into())
}
