// src/record.rs
//! Data model shared by ingestion, enrichment and the storage boundary.
//!
//! Field names follow the stored wire shape (`source_url`, `map_url`, ...), so the
//! same structs serialize straight into the storage collaborator's payload.

use serde::{Deserialize, Serialize};

/// Zoom level baked into every derived map link.
pub const MAP_ZOOM: u8 = 15;

/// Raw news item as delivered by ingestion. Never mutated by enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewsItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub body: String,
    pub source_url: String,
    pub publisher: String,
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<String>,
}

impl NewsItem {
    /// Short identifier safe for logs: the explicit id, or a hash of the source URL.
    pub fn log_key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => anon_hash(&self.source_url),
        }
    }
}

/// Structured fields derived by the generative model.
///
/// The routing hints (`media_*`, `wikipedia_search_term`, `location`,
/// `search_trend_query`, `social_sentiment_query`) only parameterize follow-up
/// lookups; `assemble` never copies them into the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_justification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_search_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_trend_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_sentiment_query: Option<String>,
}

impl EnrichmentResult {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when at least one augmentation would be triggered.
    pub fn has_routing_hints(&self) -> bool {
        self.media_justification.is_some()
            || self.wikipedia_search_term.is_some()
            || self.location.is_some()
            || self.search_trend_query.is_some()
            || self.social_sentiment_query.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaAsset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_video_url: Option<String>,
    pub media_justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
    pub map_url: String,
}

impl GeoLocation {
    /// Build from coordinates; `map_url` is always derived, never supplied.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            map_url: map_url(lat, lng),
        }
    }
}

pub fn map_url(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps/search/?api=1&query={lat},{lng}&zoom={MAP_ZOOM}")
}

/// Aggregate of successful augmentations. Absent fields mean "not requested or failed".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_trend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_sentiment: Option<String>,
}

impl Context {
    /// Number of populated sub-fields.
    pub fn len(&self) -> usize {
        [
            self.wikipedia_snippet.is_some(),
            self.geo.is_some(),
            self.search_trend.is_some(),
            self.social_sentiment.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Terminal artifact handed to storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub item: NewsItem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
