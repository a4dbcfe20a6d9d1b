// src/collectors/social.rs
//! Social sentiment: recent posts, one batched classification call.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{record_miss, trim_base, SocialPost, SocialSearch};
use crate::config::enrich::SocialConfig;
use crate::llm::{ChatRequest, DynChatModel};
use crate::text::{round_half_up, strip_code_fences};

pub const CLASSIFY_TEMPERATURE: f32 = 0.0;

pub const UNAVAILABLE_MESSAGE: &str = "Social sentiment data unavailable.";

const CLASSIFY_PROMPT: &str = "You are a sentiment analysis model. You will receive a list of tweets \
and you need to classify the sentiment of each tweet as POSITIVE, NEGATIVE, or NEUTRAL. \
Respond with a JSON object containing the percentage of positive tweets. \
The JSON object should have a single key \"positive_percentage\".";

pub struct SentimentEstimator {
    social: Arc<dyn SocialSearch>,
    model: DynChatModel,
    language: String,
}

impl SentimentEstimator {
    pub fn new(social: Arc<dyn SocialSearch>, model: DynChatModel, language: impl Into<String>) -> Self {
        Self {
            social,
            model,
            language: language.into(),
        }
    }

    /// Always returns a displayable string, never an absence.
    pub async fn estimate(&self, topic: &str) -> String {
        match self.try_estimate(topic).await {
            Ok(msg) => msg,
            Err(e) => {
                warn!(target: "enrich", provider = self.social.name(), error = %e, "social sentiment failed");
                record_miss("sentiment");
                UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }

    async fn try_estimate(&self, topic: &str) -> Result<String> {
        let posts = self.social.recent_posts(topic).await?;
        let texts: Vec<String> = posts
            .into_iter()
            .filter(|p| p.lang.as_deref() == Some(self.language.as_str()))
            .map(|p| p.text)
            .collect();

        if texts.is_empty() {
            return Ok(no_mentions_message(topic));
        }

        let payload = serde_json::to_string(&texts).context("encoding posts")?;
        let req = ChatRequest::new(CLASSIFY_PROMPT, payload, CLASSIFY_TEMPERATURE).json_object();
        let content = self.model.complete(&req).await.context("sentiment classification")?;
        let percent = parse_positive_percentage(&content)?;
        Ok(format_sentiment(percent))
    }
}

/// Rounded positive share. Missing or non-numeric values count as zero;
/// a reply that is not JSON at all is an error.
pub fn parse_positive_percentage(raw: &str) -> Result<i64> {
    let value: Value = serde_json::from_str(strip_code_fences(raw))
        .map_err(|e| anyhow!("classification reply is not JSON: {e}"))?;
    let pct = match value.get("positive_percentage") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if !pct.is_finite() {
        return Ok(0);
    }
    Ok(round_half_up(pct).clamp(0, 100))
}

pub fn format_sentiment(percent: i64) -> String {
    format!("{percent}% positive mentions on X in last 24h")
}

pub fn no_mentions_message(topic: &str) -> String {
    format!("No recent mentions of {topic} on X")
}

// ------------------------------------------------------------
// X recent search
// ------------------------------------------------------------

pub struct XClient {
    http: reqwest::Client,
    bearer_token: String,
    base_url: String,
    max_results: u32,
}

impl XClient {
    pub fn new(cfg: &SocialConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            bearer_token: cfg.bearer_token.clone(),
            base_url: trim_base(&cfg.base_url),
            max_results: cfg.max_results,
        }
    }
}

#[derive(Deserialize)]
struct SearchResp {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Deserialize)]
struct Tweet {
    text: String,
    lang: Option<String>,
}

#[async_trait]
impl SocialSearch for XClient {
    async fn recent_posts(&self, topic: &str) -> Result<Vec<SocialPost>> {
        if self.bearer_token.is_empty() {
            bail!("x bearer token is not configured");
        }
        let max = self.max_results.to_string();
        let resp: SearchResp = self
            .http
            .get(format!("{}/2/tweets/search/recent", self.base_url))
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", topic),
                ("max_results", max.as_str()),
                ("tweet.fields", "lang"),
            ])
            .send()
            .await
            .context("x search request")?
            .error_for_status()
            .context("x search non-2xx")?
            .json()
            .await
            .context("x search body")?;
        Ok(resp
            .data
            .into_iter()
            .map(|t| SocialPost {
                text: t.text,
                lang: t.lang,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "x"
    }
}
