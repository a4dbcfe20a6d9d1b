// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /news (record produced -> 200, extraction fatal -> 204, bad payload -> 4xx)

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use common::MockSet;
use news_enricher::api::{self, AppState};
use news_enricher::enrich::PipelineSettings;
use news_enricher::llm::MockModel;
use news_enricher::sink::RecordSink;
use news_enricher::{EnrichedRecord, Enricher};

const BODY_LIMIT: usize = 1 * 1024 * 1024; // 1MB, safe for tests

#[derive(Default)]
struct MemorySink(Mutex<Vec<EnrichedRecord>>);

#[async_trait::async_trait]
impl RecordSink for MemorySink {
    async fn store(&self, record: &EnrichedRecord) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(record.clone());
        Ok(())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Build the same Router the binary uses, over mock sources.
fn test_router(model: MockModel, sink: Arc<MemorySink>) -> Router {
    let settings = PipelineSettings {
        geocode_delay: Duration::from_millis(1),
        collector_timeout: Duration::from_secs(5),
    };
    let enricher = Enricher::new(Arc::new(model), MockSet::found().sources(), "en", settings);
    api::router(AppState {
        enricher: Arc::new(enricher),
        sink,
    })
}

fn news_payload() -> Json {
    json!({
        "id": "n-1",
        "title": "Kenya launches new rail link",
        "body": "The new line connects Nairobi to the coast. ".repeat(8),
        "source_url": "https://news.example.test/rail",
        "publisher": "Example Times",
        "published_at": "2025-05-01T08:00:00Z"
    })
}

fn post_news(payload: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/news")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /news")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(MockModel::new(), Arc::default());

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_news_returns_enriched_record_and_stores_it() {
    let sink = Arc::new(MemorySink::default());
    let model = MockModel::new().reply(
        r##"{"summary":"Rail link opens.","tags":["#Kenya","#Rail","#Transport"],"relevance_score":0.8,"wikipedia_search_term":"Nairobi"}"##,
    );
    let app = test_router(model, sink.clone());

    let resp = app.oneshot(post_news(&news_payload())).await.expect("oneshot /news");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v: Json = serde_json::from_slice(&bytes).expect("json body");

    // Base fields are flattened next to enrichment fields.
    assert_eq!(v["id"], "n-1");
    assert_eq!(v["title"], "Kenya launches new rail link");
    assert_eq!(v["summary"], "Rail link opens.");
    assert_eq!(v["tags"].as_array().map(|a| a.len()), Some(3));
    assert!(v["context"]["wikipedia_snippet"].is_string());
    assert!(v.get("media").is_none(), "no justification, no media");
    assert!(v.get("wikipedia_search_term").is_none(), "hints are not persisted");

    let stored = sink.0.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].summary.as_deref(), Some("Rail link opens."));
}

#[tokio::test]
async fn api_news_returns_204_when_extraction_fails() {
    let sink = Arc::new(MemorySink::default());
    let app = test_router(MockModel::new().fail("provider 500"), sink.clone());

    let resp = app.oneshot(post_news(&news_payload())).await.expect("oneshot /news");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(sink.0.lock().unwrap().is_empty(), "nothing forwarded");
}

#[tokio::test]
async fn api_news_rejects_payload_without_required_fields() {
    let app = test_router(MockModel::new(), Arc::default());

    let resp = app
        .oneshot(post_news(&json!({ "title": "only a title" })))
        .await
        .expect("oneshot /news");
    assert!(resp.status().is_client_error(), "got {}", resp.status());
}
