// src/collectors/mod.rs
//! Augmentation collectors.
//!
//! Each external source sits behind a small trait returning `anyhow::Result`;
//! the component types (`MediaResolver`, `SnippetFetcher`, `Geocoder`,
//! `TrendEstimator`, `SentimentEstimator`) own the failure policy and turn
//! every error into an absent value or a displayable sentinel string.

pub mod geocode;
pub mod media;
pub mod social;
pub mod trend;
pub mod wikipedia;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;

use crate::config::EnrichConfig;

pub use geocode::{Geocoder, NominatimClient};
pub use media::{MediaResolver, SerperImages, YouTubeClient};
pub use social::{SentimentEstimator, XClient};
pub use trend::{SerperSearch, TrendEstimator};
pub use wikipedia::{SnippetFetcher, WikipediaClient};

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// First image URL for the query, if any.
    async fn first_image(&self, query: &str) -> Result<Option<String>>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Canonical watch URL of the first video for the query, if any.
    async fn first_video(&self, query: &str) -> Result<Option<String>>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Raw intro extract for a page title; `None` when no page matches.
    async fn extract(&self, title: &str) -> Result<Option<String>>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait GeocodeSource: Send + Sync {
    /// `(lat, lng)` of the first match.
    async fn lookup(&self, location: &str) -> Result<Option<(f64, f64)>>;
    fn name(&self) -> &'static str;
}

/// Result counts for one web search; only the lengths matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCounts {
    pub organic: usize,
    pub related: usize,
}

impl SearchCounts {
    /// Weighted search-volume proxy.
    pub fn volume(&self) -> u64 {
        self.organic as u64 * 10 + self.related as u64 * 5
    }
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// `window` is the provider's time-window token (`qdr:w`, `qdr:2w`).
    async fn counts(&self, query: &str, window: &str) -> Result<SearchCounts>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialPost {
    pub text: String,
    pub lang: Option<String>,
}

#[async_trait]
pub trait SocialSearch: Send + Sync {
    /// Recent posts mentioning the topic, unfiltered.
    async fn recent_posts(&self, topic: &str) -> Result<Vec<SocialPost>>;
    fn name(&self) -> &'static str;
}

/// The external sources, shared across concurrently processed items.
#[derive(Clone)]
pub struct Sources {
    pub images: Arc<dyn ImageSearch>,
    pub videos: Arc<dyn VideoSearch>,
    pub knowledge: Arc<dyn KnowledgeSource>,
    pub geocoder: Arc<dyn GeocodeSource>,
    pub search: Arc<dyn WebSearch>,
    pub social: Arc<dyn SocialSearch>,
}

impl Sources {
    /// Real HTTP clients over one shared `reqwest::Client`.
    pub fn from_config(cfg: &EnrichConfig, http: reqwest::Client) -> Self {
        Self {
            images: Arc::new(SerperImages::new(&cfg.serper, http.clone())),
            videos: Arc::new(YouTubeClient::new(&cfg.youtube, http.clone())),
            knowledge: Arc::new(WikipediaClient::new(&cfg.wikipedia, http.clone())),
            geocoder: Arc::new(NominatimClient::new(&cfg.nominatim, http.clone())),
            search: Arc::new(SerperSearch::new(&cfg.serper, http.clone())),
            social: Arc::new(XClient::new(&cfg.social, http)),
        }
    }
}

/// Count a contained collector failure or miss.
pub(crate) fn record_miss(collector: &'static str) {
    counter!("enrich_collector_misses_total", "collector" => collector).increment(1);
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
