// src/config/enrich.rs
//! Service configuration. One explicit value built at startup and handed to each
//! component; nothing reads credentials from process state after that.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

pub const ENV_CONFIG_PATH: &str = "ENRICH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/enrich.toml";

pub const ENV_MODEL_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_SERPER_KEY: &str = "SERPER_API_KEY";
pub const ENV_YOUTUBE_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_X_TOKEN: &str = "X_BEARER_TOKEN";
pub const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const ENV_SINK_WEBHOOK: &str = "STORAGE_WEBHOOK_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub model: ModelConfig,
    pub serper: SerperConfig,
    pub youtube: YouTubeConfig,
    pub wikipedia: WikipediaConfig,
    pub nominatim: NominatimConfig,
    pub social: SocialConfig,
    pub http: HttpConfig,
    pub pipeline: PipelineConfig,
    pub ingest: IngestConfig,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// "ENV" (or empty) means: read from OPENROUTER_API_KEY
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub site_url: String,
    pub app_name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".into(),
            model: "qwen/qwen2.5-vl-72b-instruct:free".into(),
            base_url: "https://openrouter.ai/api/v1".into(),
            site_url: "https://swen.ai".into(),
            app_name: "SWEN".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerperConfig {
    pub api_key: String,
    pub base_url: String,
    pub gl: String,
    pub hl: String,
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".into(),
            base_url: "https://google.serper.dev".into(),
            gl: "us".into(),
            hl: "en".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".into(),
            base_url: "https://www.googleapis.com".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    pub base_url: String,
    pub extract_chars: u32,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://en.wikipedia.org".into(),
            extract_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NominatimConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Fixed pause before every geocode request (provider usage policy).
    pub delay_ms: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".into(),
            user_agent: "SWEN/1.0 (dev@swen.ai)".into(),
            delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub bearer_token: String,
    pub base_url: String,
    pub language: String,
    pub max_results: u32,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            bearer_token: "ENV".into(),
            base_url: "https://api.x.com".into(),
            language: "en".into(),
            max_results: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 4,
            user_agent: "news-enricher/0.1".into(),
        }
    }
}

impl HttpConfig {
    /// Shared outbound client; cheap to clone and safe across concurrent pipelines.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("building http client")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound for each augmentation task, geocode delay included.
    pub collector_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collector_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub enabled: bool,
    pub api_key: String,
    pub base_url: String,
    pub query: String,
    pub limit: usize,
    pub min_body_chars: usize,
    pub interval_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: "ENV".into(),
            base_url: "https://newsapi.org".into(),
            query: "africa".into(),
            limit: 5,
            min_body_chars: 200,
            interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Storage webhook; "ENV" reads STORAGE_WEBHOOK_URL, empty logs records instead.
    pub webhook_url: String,
}

impl EnrichConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading enrich config from {}", path.display()))?;
        let cfg: EnrichConfig = toml::from_str(&data)
            .with_context(|| format!("parsing enrich config {}", path.display()))?;
        Ok(cfg.resolved())
    }

    /// 1) $ENRICH_CONFIG_PATH
    /// 2) config/enrich.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Ok(Self::default().resolved())
    }

    /// Resolve "ENV" placeholders and clamp values that would break the pipeline.
    pub fn resolved(mut self) -> Self {
        resolve_secret(&mut self.model.api_key, ENV_MODEL_KEY);
        resolve_secret(&mut self.serper.api_key, ENV_SERPER_KEY);
        resolve_secret(&mut self.youtube.api_key, ENV_YOUTUBE_KEY);
        resolve_secret(&mut self.social.bearer_token, ENV_X_TOKEN);
        resolve_secret(&mut self.ingest.api_key, ENV_NEWSAPI_KEY);
        resolve_secret(&mut self.sink.webhook_url, ENV_SINK_WEBHOOK);

        if self.social.max_results == 0 {
            self.social.max_results = SocialConfig::default().max_results;
        }
        if self.wikipedia.extract_chars == 0 {
            self.wikipedia.extract_chars = WikipediaConfig::default().extract_chars;
        }
        if self.pipeline.collector_timeout_secs == 0 {
            self.pipeline.collector_timeout_secs = PipelineConfig::default().collector_timeout_secs;
        }
        // Nominatim allows at most one request per second.
        if self.nominatim.delay_ms == 0 {
            self.nominatim.delay_ms = NominatimConfig::default().delay_ms;
        }
        self
    }

    pub fn geocode_delay(&self) -> Duration {
        Duration::from_millis(self.nominatim.delay_ms)
    }

    pub fn collector_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.collector_timeout_secs)
    }
}

/// A missing env var leaves the secret empty; the client using it reports the gap per call.
fn resolve_secret(slot: &mut String, env_name: &str) {
    let trimmed = slot.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("env") {
        *slot = env::var(env_name).unwrap_or_default();
    }
}
