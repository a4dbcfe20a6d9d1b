// src/collectors/media.rs
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::{record_miss, trim_base, ImageSearch, VideoSearch};
use crate::config::enrich::{SerperConfig, YouTubeConfig};
use crate::record::MediaAsset;

pub const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Image + video lookup. A `MediaAsset` exists only if at least one was found.
pub struct MediaResolver {
    images: Arc<dyn ImageSearch>,
    videos: Arc<dyn VideoSearch>,
}

impl MediaResolver {
    pub fn new(images: Arc<dyn ImageSearch>, videos: Arc<dyn VideoSearch>) -> Self {
        Self { images, videos }
    }

    pub async fn resolve(&self, query: &str, justification: &str) -> Option<MediaAsset> {
        let (image, video) = tokio::join!(
            self.images.first_image(query),
            self.videos.first_video(query)
        );

        let featured_image_url = image.unwrap_or_else(|e| {
            warn!(target: "enrich", provider = self.images.name(), error = %e, "image search failed");
            None
        });
        let related_video_url = video.unwrap_or_else(|e| {
            warn!(target: "enrich", provider = self.videos.name(), error = %e, "video search failed");
            None
        });

        if featured_image_url.is_none() && related_video_url.is_none() {
            record_miss("media");
            return None;
        }
        Some(MediaAsset {
            featured_image_url,
            related_video_url,
            media_justification: justification.to_string(),
        })
    }
}

// ------------------------------------------------------------
// Serper image search
// ------------------------------------------------------------

pub struct SerperImages {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerperImages {
    pub fn new(cfg: &SerperConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: cfg.api_key.clone(),
            base_url: trim_base(&cfg.base_url),
        }
    }
}

#[derive(Deserialize)]
struct ImagesResp {
    #[serde(default)]
    images: Vec<ImageHit>,
}

#[derive(Deserialize)]
struct ImageHit {
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
}

#[async_trait]
impl ImageSearch for SerperImages {
    async fn first_image(&self, query: &str) -> Result<Option<String>> {
        if self.api_key.is_empty() {
            bail!("serper api key is not configured");
        }
        let resp: ImagesResp = self
            .http
            .post(format!("{}/images", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await
            .context("serper images request")?
            .error_for_status()
            .context("serper images non-2xx")?
            .json()
            .await
            .context("serper images body")?;
        Ok(resp
            .images
            .into_iter()
            .next()
            .and_then(|h| h.image_url)
            .filter(|u| !u.is_empty()))
    }

    fn name(&self) -> &'static str {
        "serper-images"
    }
}

// ------------------------------------------------------------
// YouTube data API search
// ------------------------------------------------------------

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(cfg: &YouTubeConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: cfg.api_key.clone(),
            base_url: trim_base(&cfg.base_url),
        }
    }
}

#[derive(Deserialize)]
struct VideosResp {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    id: VideoId,
}

#[derive(Deserialize)]
struct VideoId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn first_video(&self, query: &str) -> Result<Option<String>> {
        if self.api_key.is_empty() {
            bail!("youtube api key is not configured");
        }
        let resp: VideosResp = self
            .http
            .get(format!("{}/youtube/v3/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("youtube search request")?
            .error_for_status()
            .context("youtube search non-2xx")?
            .json()
            .await
            .context("youtube search body")?;
        Ok(resp
            .items
            .into_iter()
            .next()
            .and_then(|it| it.id.video_id)
            .filter(|id| !id.is_empty())
            .map(|id| format!("{YOUTUBE_WATCH_URL}{id}")))
    }

    fn name(&self) -> &'static str {
        "youtube"
    }
}
