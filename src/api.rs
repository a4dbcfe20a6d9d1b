use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::enrich::Enricher;
use crate::record::NewsItem;
use crate::sink::{forward, RecordSink};

#[derive(Clone)]
pub struct AppState {
    pub enricher: Arc<Enricher>,
    pub sink: Arc<dyn RecordSink>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", post(news_created))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Enrich an incoming item and forward it to storage.
/// 200 + record when one was produced, 204 when there is nothing to forward.
async fn news_created(State(state): State<AppState>, Json(item): Json<NewsItem>) -> Response {
    match forward(&state.enricher, state.sink.as_ref(), &item).await {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
