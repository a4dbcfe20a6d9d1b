// src/ingest/providers/newsapi.rs
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::config::enrich::IngestConfig;
use crate::ingest::types::NewsProvider;
use crate::record::NewsItem;

#[derive(Debug, Deserialize)]
struct Everything {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    content: Option<String>,
    url: Option<String>,
    source: Option<ArticleSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

pub struct NewsApiProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        base_url: String,
        api_key: String,
        query: String,
    },
}

impl NewsApiProvider {
    /// Parse an embedded `/v2/everything` response instead of calling the API.
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_config(cfg: &IngestConfig, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                client,
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                api_key: cfg.api_key.clone(),
                query: cfg.query.clone(),
            },
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<NewsItem>> {
        let resp: Everything = serde_json::from_str(s).context("parsing newsapi response")?;
        let items: Vec<NewsItem> = resp.articles.into_iter().map(to_news_item).collect();
        counter!("ingest_events_total").increment(items.len() as u64);
        Ok(items)
    }
}

fn to_news_item(a: Article) -> NewsItem {
    NewsItem {
        id: None,
        title: a.title.unwrap_or_default(),
        body: a.content.unwrap_or_default(),
        source_url: a.url.unwrap_or_default(),
        publisher: a.source.and_then(|s| s.name).unwrap_or_default(),
        published_at: a.published_at.unwrap_or_default(),
        ingested_at: None,
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http {
                client,
                base_url,
                api_key,
                query,
            } => {
                if api_key.is_empty() {
                    bail!("newsapi key is not configured");
                }
                let body = client
                    .get(format!("{base_url}/v2/everything"))
                    .query(&[("q", query.as_str()), ("apiKey", api_key.as_str())])
                    .send()
                    .await
                    .context("newsapi get()")?
                    .error_for_status()
                    .context("newsapi non-2xx")?
                    .text()
                    .await
                    .context("newsapi .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "NewsAPI"
    }
}
