// src/enrich/extractor.rs
//! Enrichment extraction: one model call, at most one repair call, then a
//! normalized `EnrichmentResult` or a degrade-to-baseline `Empty`.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

use crate::llm::{ChatRequest, DynChatModel};
use crate::record::{EnrichmentResult, NewsItem};
use crate::text::strip_code_fences;

pub const EXTRACTION_TEMPERATURE: f32 = 0.4;
pub const REPAIR_TEMPERATURE: f32 = 0.0;

pub const MIN_TAGS: usize = 3;
pub const MAX_TAGS: usize = 5;

const EXTRACTION_PROMPT: &str = "You are an AI content enrichment model for African news. \
Respond in strict JSON format. All property names and string values must be enclosed in double quotes. \
The fields are: summary, tags (3-5 hashtags), relevance_score (0.0-1.0, African audience relevance), \
media_justification (string), media_query (a short, 1-3 word subject from the text for an image and video search), \
wikipedia_search_term (a short, 1-3 word keyword/phrase from the text for a Wikipedia search), \
location (a location name from the text), \
search_trend_query (a short, 1-3 word keyword/phrase from the text for a Google search trend analysis), \
social_sentiment_query (a short, 1-3 word keyword/phrase from the text for a social sentiment analysis on X)";

const REPAIR_PROMPT: &str = "You are a JSON fixer. You will receive a string that is not valid JSON \
and you need to fix it. Respond only with the corrected JSON.";

/// How the extraction ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// First response parsed.
    Valid(EnrichmentResult),
    /// First response was malformed; the single repair call produced valid JSON.
    Repaired(EnrichmentResult),
    /// Nothing usable: the record keeps only the original news fields.
    Empty,
}

impl Extraction {
    pub fn result(&self) -> Option<&EnrichmentResult> {
        match self {
            Extraction::Valid(r) | Extraction::Repaired(r) => Some(r),
            Extraction::Empty => None,
        }
    }

    pub fn into_result(self) -> EnrichmentResult {
        match self {
            Extraction::Valid(r) | Extraction::Repaired(r) => r,
            Extraction::Empty => EnrichmentResult::default(),
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Extraction::Valid(_) => "valid",
            Extraction::Repaired(_) => "repaired",
            Extraction::Empty => "empty",
        }
    }
}

pub struct Extractor {
    model: DynChatModel,
}

impl Extractor {
    pub fn new(model: DynChatModel) -> Self {
        Self { model }
    }

    /// `Err` only when the first model call fails at the transport level.
    pub async fn extract(&self, item: &NewsItem) -> Result<Extraction> {
        let req = ChatRequest::new(
            EXTRACTION_PROMPT,
            format!("Title: {}\nBody: {}", item.title, item.body),
            EXTRACTION_TEMPERATURE,
        );
        let content = self
            .model
            .complete(&req)
            .await
            .context("extraction model call")?;

        if let Some(result) = parse_enrichment(&content) {
            return Ok(Extraction::Valid(result));
        }

        warn!(
            target: "enrich",
            item = %item.log_key(),
            provider = self.model.provider_name(),
            "malformed extraction JSON, attempting repair"
        );
        Ok(self.repair(&content, item).await)
    }

    async fn repair(&self, malformed: &str, item: &NewsItem) -> Extraction {
        let req = ChatRequest::new(
            REPAIR_PROMPT,
            format!("Fix this JSON string: {malformed}"),
            REPAIR_TEMPERATURE,
        );
        let fixed = match self.model.complete(&req).await {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    target: "enrich",
                    item = %item.log_key(),
                    provider = self.model.provider_name(),
                    error = %e,
                    "repair call failed"
                );
                return Extraction::Empty;
            }
        };
        match parse_enrichment(&fixed) {
            Some(result) => Extraction::Repaired(result),
            None => {
                warn!(
                    target: "enrich",
                    item = %item.log_key(),
                    provider = self.model.provider_name(),
                    original_len = malformed.len(),
                    fixed_len = fixed.len(),
                    "repaired JSON still malformed, continuing without enrichment"
                );
                Extraction::Empty
            }
        }
    }
}

/// Parse a model reply into a normalized result. `None` if it is not a JSON object.
pub fn parse_enrichment(raw: &str) -> Option<EnrichmentResult> {
    let value: Value = serde_json::from_str(strip_code_fences(raw)).ok()?;
    match value {
        Value::Object(map) => Some(from_object(&map)),
        _ => None,
    }
}

fn from_object(map: &Map<String, Value>) -> EnrichmentResult {
    EnrichmentResult {
        summary: string_field(map, "summary"),
        tags: tags_field(map),
        relevance_score: score_field(map),
        media_justification: string_field(map, "media_justification"),
        media_query: string_field(map, "media_query"),
        wikipedia_search_term: string_field(map, "wikipedia_search_term"),
        location: string_field(map, "location"),
        search_trend_query: string_field(map, "search_trend_query"),
        social_sentiment_query: string_field(map, "social_sentiment_query"),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Trimmed, de-duplicated, at most five; fewer than three drops the field.
fn tags_field(map: &Map<String, Value>) -> Option<Vec<String>> {
    let arr = map.get("tags")?.as_array()?;
    let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);
    for t in arr.iter().filter_map(Value::as_str) {
        let t = t.trim();
        if t.is_empty() || tags.iter().any(|x| x == t) {
            continue;
        }
        tags.push(t.to_string());
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    (tags.len() >= MIN_TAGS).then_some(tags)
}

fn score_field(map: &Map<String, Value>) -> Option<f64> {
    let raw = match map.get("relevance_score")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    raw.is_finite().then(|| raw.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_object() {
        let raw = r##"{"summary":" A summary. ","tags":["#a","#b","#c"],"relevance_score":0.8,
            "media_justification":"Shows the scene","wikipedia_search_term":"Lagos",
            "location":"Lagos, Nigeria","search_trend_query":"Lagos floods",
            "social_sentiment_query":"Lagos"}"##;
        let r = parse_enrichment(raw).unwrap();
        assert_eq!(r.summary.as_deref(), Some("A summary."));
        assert_eq!(r.tags.as_ref().map(Vec::len), Some(3));
        assert_eq!(r.relevance_score, Some(0.8));
        assert_eq!(r.location.as_deref(), Some("Lagos, Nigeria"));
        assert!(r.media_query.is_none());
    }

    #[test]
    fn non_object_json_counts_as_malformed() {
        assert!(parse_enrichment("[1,2,3]").is_none());
        assert!(parse_enrichment("\"summary\"").is_none());
        assert!(parse_enrichment("{summary: 'x'").is_none());
    }

    #[test]
    fn fenced_json_is_accepted() {
        let r = parse_enrichment("```json\n{\"summary\":\"x\"}\n```").unwrap();
        assert_eq!(r.summary.as_deref(), Some("x"));
    }

    #[test]
    fn tags_are_bounded() {
        let many = r##"{"tags":["#1","#2","#2","#3","#4","#5","#6"]}"##;
        let r = parse_enrichment(many).unwrap();
        assert_eq!(r.tags.unwrap(), vec!["#1", "#2", "#3", "#4", "#5"]);

        let few = r##"{"tags":["#1"," ","#2"]}"##;
        assert!(parse_enrichment(few).unwrap().tags.is_none());
    }

    #[test]
    fn relevance_is_clamped_and_finite() {
        let hi = parse_enrichment(r#"{"relevance_score": 7}"#).unwrap();
        assert_eq!(hi.relevance_score, Some(1.0));
        let lo = parse_enrichment(r#"{"relevance_score": -0.3}"#).unwrap();
        assert_eq!(lo.relevance_score, Some(0.0));
        let text = parse_enrichment(r#"{"relevance_score": "0.25"}"#).unwrap();
        assert_eq!(text.relevance_score, Some(0.25));
        let bad = parse_enrichment(r#"{"relevance_score": "NaN"}"#).unwrap();
        assert_eq!(bad.relevance_score, None);
        let junk = parse_enrichment(r#"{"relevance_score": "high"}"#).unwrap();
        assert_eq!(junk.relevance_score, None);
    }

    #[test]
    fn empty_strings_are_absent_hints() {
        let r = parse_enrichment(r#"{"location":"  ","wikipedia_search_term":""}"#).unwrap();
        assert!(!r.has_routing_hints());
        assert!(r.is_empty());
    }
}
