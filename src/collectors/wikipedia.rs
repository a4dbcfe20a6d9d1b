// src/collectors/wikipedia.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{record_miss, trim_base, KnowledgeSource};
use crate::config::enrich::WikipediaConfig;
use crate::text::collapse_whitespace;

/// Page id the encyclopedia uses for "no such page".
const MISSING_PAGE_ID: &str = "-1";

/// Short encyclopedic snippet for a term. Misses and errors both yield `None`.
pub struct SnippetFetcher {
    source: Arc<dyn KnowledgeSource>,
}

impl SnippetFetcher {
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self { source }
    }

    pub async fn fetch_snippet(&self, term: &str) -> Option<String> {
        let raw = match self.source.extract(term).await {
            Ok(v) => v,
            Err(e) => {
                warn!(target: "enrich", provider = self.source.name(), error = %e, "snippet lookup failed");
                None
            }
        };
        let snippet = raw.map(|s| collapse_whitespace(&s)).filter(|s| !s.is_empty());
        if snippet.is_none() {
            record_miss("wikipedia");
        }
        snippet
    }
}

pub struct WikipediaClient {
    http: reqwest::Client,
    base_url: String,
    extract_chars: u32,
}

impl WikipediaClient {
    pub fn new(cfg: &WikipediaConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: trim_base(&cfg.base_url),
            extract_chars: cfg.extract_chars,
        }
    }
}

#[derive(Deserialize)]
struct QueryResp {
    query: Option<QueryBody>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: BTreeMap<String, Page>,
}

#[derive(Deserialize)]
struct Page {
    extract: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    async fn extract(&self, title: &str) -> Result<Option<String>> {
        let chars = self.extract_chars.to_string();
        let resp: QueryResp = self
            .http
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "extracts"),
                ("exintro", "true"),
                ("explaintext", "true"),
                ("exchars", chars.as_str()),
                ("redirects", "true"),
            ])
            .send()
            .await
            .context("wikipedia request")?
            .error_for_status()
            .context("wikipedia non-2xx")?
            .json()
            .await
            .context("wikipedia body")?;

        if let Some(err) = resp.error {
            return Err(anyhow!("wikipedia api error {}: {}", err.code, err.info));
        }
        let Some((page_id, page)) = resp.query.and_then(|q| q.pages.into_iter().next()) else {
            return Ok(None);
        };
        if page_id == MISSING_PAGE_ID {
            return Ok(None);
        }
        Ok(page.extract.filter(|e| !e.trim().is_empty()))
    }

    fn name(&self) -> &'static str {
        "wikipedia"
    }
}
