//! Generative model seam: a chat-completion trait, the OpenRouter provider,
//! and a scripted mock for tests/local runs.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::enrich::ModelConfig;

/// One system + user exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Ask the provider for a JSON object response format.
    pub json_object: bool,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
            json_object: false,
        }
    }

    pub fn json_object(mut self) -> Self {
        self.json_object = true;
        self
    }
}

/// Trait object used by the extractor and the sentiment estimator.
pub trait ChatModel: Send + Sync {
    /// Returns the first choice's content. An absent content comes back as `"{}"`.
    /// `Err` means the call itself failed (transport, auth, non-2xx).
    fn complete<'a>(
        &'a self,
        req: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynChatModel = Arc<dyn ChatModel>;

/// Factory: build a model according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns a mock that answers every call with a
///   minimal extraction (no routing hints, so no augmentation fires).
/// * Otherwise builds the OpenRouter provider on the shared client.
pub fn build_chat_model(cfg: &ModelConfig, http: reqwest::Client) -> DynChatModel {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockModel::fixed(
            r##"{"summary":"Mock summary.","tags":["#news","#africa","#mock"],"relevance_score":0.5}"##,
        ));
    }
    Arc::new(OpenRouterModel::new(cfg, http))
}

// ------------------------------------------------------------
// OpenRouter provider (OpenAI-compatible chat completions)
// ------------------------------------------------------------

pub struct OpenRouterModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    site_url: String,
    app_name: String,
}

impl OpenRouterModel {
    pub fn new(cfg: &ModelConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            site_url: cfg.site_url.clone(),
            app_name: cfg.app_name.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(&self.site_url) {
            headers.insert("HTTP-Referer", val);
        }
        if let Ok(val) = HeaderValue::from_str(&self.app_name) {
            headers.insert("X-Title", val);
        }
        headers
    }

    async fn complete_impl(&self, req: &ChatRequest) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("model api key is not configured");
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            response_format: Option<ResponseFormat>,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &req.system,
                },
                Msg {
                    role: "user",
                    content: &req.user,
                },
            ],
            temperature: req.temperature,
            response_format: req.json_object.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        debug!(model = %self.model, temperature = req.temperature, "chat completion request");

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .headers(self.headers())
            .json(&body)
            .send()
            .await
            .context("chat completion request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("chat completion error ({status}): {text}"));
        }

        let parsed: Resp = resp.json().await.context("chat completion body")?;
        let first = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;
        Ok(first
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "{}".to_string()))
    }
}

impl ChatModel for OpenRouterModel {
    fn complete<'a>(
        &'a self,
        req: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.complete_impl(req))
    }
    fn provider_name(&self) -> &'static str {
        "openrouter"
    }
}

// ------------------------------------------------------------
// Mock provider
// ------------------------------------------------------------

/// Scripted model: pops queued replies in order, then falls back to `fallback`.
/// Every request is recorded so tests can count calls and inspect prompts.
pub struct MockModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    calls: Mutex<Vec<ChatRequest>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `reply`.
    pub fn fixed(reply: &str) -> Self {
        Self {
            fallback: Some(reply.to_string()),
            ..Self::new()
        }
    }

    pub fn reply(self, content: &str) -> Self {
        self.push(Ok(content.to_string()));
        self
    }

    /// Queue a transport-level failure.
    pub fn fail(self, message: &str) -> Self {
        self.push(Err(message.to_string()));
        self
    }

    fn push(&self, item: Result<String, String>) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(item);
        }
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    fn next_reply(&self, req: &ChatRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(req.clone());
        }
        let queued = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match queued {
            Some(Ok(s)) => Ok(s),
            Some(Err(e)) => Err(anyhow!(e)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| anyhow!("mock model has no scripted reply")),
        }
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatModel for MockModel {
    fn complete<'a>(
        &'a self,
        req: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let out = self.next_reply(req);
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_pops_in_order_then_falls_back() {
        let m = MockModel::fixed("fallback").reply("first").fail("boom");
        let req = ChatRequest::new("sys", "user", 0.0);
        assert_eq!(m.complete(&req).await.unwrap(), "first");
        assert!(m.complete(&req).await.is_err());
        assert_eq!(m.complete(&req).await.unwrap(), "fallback");
        assert_eq!(m.call_count(), 3);
    }

    #[tokio::test]
    async fn openrouter_without_key_fails_fast() {
        let cfg = ModelConfig {
            api_key: String::new(),
            ..ModelConfig::default()
        };
        let m = OpenRouterModel::new(&cfg, reqwest::Client::new());
        let req = ChatRequest::new("sys", "user", 0.4);
        assert!(m.complete(&req).await.is_err());
        assert_eq!(m.provider_name(), "openrouter");
        assert_eq!(MockModel::new().provider_name(), "mock");
    }
}
