// src/collectors/trend.rs
//! Week-over-week search trend from a web-search volume proxy.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{record_miss, trim_base, SearchCounts, WebSearch};
use crate::config::enrich::SerperConfig;
use crate::text::round_half_up;

pub const CURRENT_WINDOW: &str = "qdr:w";
pub const PREVIOUS_WINDOW: &str = "qdr:2w";

pub struct TrendEstimator {
    search: Arc<dyn WebSearch>,
}

impl TrendEstimator {
    pub fn new(search: Arc<dyn WebSearch>) -> Self {
        Self { search }
    }

    /// Always returns a displayable string. A failed window counts as zero
    /// volume; only when both windows fail is the trend reported unavailable.
    pub async fn estimate(&self, query: &str) -> String {
        let (current, previous) = tokio::join!(
            self.volume(query, CURRENT_WINDOW),
            self.volume(query, PREVIOUS_WINDOW)
        );
        match (current, previous) {
            (None, None) => {
                record_miss("trend");
                unavailable_message(query)
            }
            (c, p) => format_trend(query, c.unwrap_or(0), p.unwrap_or(0)),
        }
    }

    async fn volume(&self, query: &str, window: &str) -> Option<u64> {
        match self.search.counts(query, window).await {
            Ok(counts) => Some(counts.volume()),
            Err(e) => {
                warn!(target: "enrich", provider = self.search.name(), window, error = %e, "search volume fetch failed");
                None
            }
        }
    }
}

/// Rounded growth in percent; zero when there is no previous volume.
pub fn growth_percent(current: u64, previous: u64) -> i64 {
    if previous == 0 {
        return 0;
    }
    let diff = (current as f64 - previous as f64) / previous as f64 * 100.0;
    round_half_up(diff)
}

pub fn format_trend(query: &str, current: u64, previous: u64) -> String {
    let growth = growth_percent(current, previous);
    if growth > 0 {
        format!("'{query}' +{growth}% this week")
    } else if growth < 0 {
        format!("'{query}' {growth}% this week")
    } else {
        format!("'{query}' stable this week")
    }
}

pub fn unavailable_message(query: &str) -> String {
    format!("'{query}' trend unavailable.")
}

// ------------------------------------------------------------
// Serper web search
// ------------------------------------------------------------

pub struct SerperSearch {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    gl: String,
    hl: String,
}

impl SerperSearch {
    pub fn new(cfg: &SerperConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: cfg.api_key.clone(),
            base_url: trim_base(&cfg.base_url),
            gl: cfg.gl.clone(),
            hl: cfg.hl.clone(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResp {
    #[serde(default)]
    organic: Vec<serde_json::Value>,
    #[serde(default, rename = "relatedSearches")]
    related_searches: Vec<serde_json::Value>,
}

#[async_trait]
impl WebSearch for SerperSearch {
    async fn counts(&self, query: &str, window: &str) -> Result<SearchCounts> {
        if self.api_key.is_empty() {
            bail!("serper api key is not configured");
        }
        let body = serde_json::json!({
            "q": query,
            "tbs": window,
            "gl": self.gl,
            "hl": self.hl,
            "page": 1,
        });
        let resp: SearchResp = self
            .http
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("serper search request")?
            .error_for_status()
            .context("serper search non-2xx")?
            .json()
            .await
            .context("serper search body")?;
        Ok(SearchCounts {
            organic: resp.organic.len(),
            related: resp.related_searches.len(),
        })
    }

    fn name(&self) -> &'static str {
        "serper-search"
    }
}
