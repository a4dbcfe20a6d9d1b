// src/enrich/assembler.rs
//! Pure merge of extraction + augmentation outputs onto the base item.
//! No I/O; same inputs always give the same record.

use crate::record::{Context, EnrichedRecord, EnrichmentResult, GeoLocation, MediaAsset, NewsItem};

/// Outputs of the collectors for one item. `None` = not requested or failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Augmentations {
    pub media: Option<MediaAsset>,
    pub wikipedia_snippet: Option<String>,
    pub geo: Option<GeoLocation>,
    pub search_trend: Option<String>,
    pub social_sentiment: Option<String>,
}

/// Accumulates context sub-fields. The `Context` is only allocated by the first
/// successful write, and a field once written is never replaced.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    ctx: Option<Context>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self) -> &mut Context {
        self.ctx.get_or_insert_with(Context::default)
    }

    pub fn wikipedia_snippet(&mut self, snippet: Option<String>) -> &mut Self {
        if let Some(s) = snippet {
            self.entry().wikipedia_snippet.get_or_insert(s);
        }
        self
    }

    pub fn geo(&mut self, geo: Option<GeoLocation>) -> &mut Self {
        if let Some(g) = geo {
            self.entry().geo.get_or_insert(g);
        }
        self
    }

    pub fn search_trend(&mut self, trend: Option<String>) -> &mut Self {
        if let Some(t) = trend {
            self.entry().search_trend.get_or_insert(t);
        }
        self
    }

    pub fn social_sentiment(&mut self, sentiment: Option<String>) -> &mut Self {
        if let Some(s) = sentiment {
            self.entry().social_sentiment.get_or_insert(s);
        }
        self
    }

    pub fn is_allocated(&self) -> bool {
        self.ctx.is_some()
    }

    pub fn build(self) -> Option<Context> {
        self.ctx
    }
}

/// Merge order: base ← extraction (non-routing fields) ← media ← snippet ← geo ← trend ← sentiment.
pub fn assemble(
    base: &NewsItem,
    extraction: &EnrichmentResult,
    augmentations: Augmentations,
) -> EnrichedRecord {
    let Augmentations {
        media,
        wikipedia_snippet,
        geo,
        search_trend,
        social_sentiment,
    } = augmentations;

    let mut ctx = ContextBuilder::new();
    ctx.wikipedia_snippet(wikipedia_snippet)
        .geo(geo)
        .search_trend(search_trend)
        .social_sentiment(social_sentiment);

    EnrichedRecord {
        item: base.clone(),
        summary: extraction.summary.clone(),
        tags: extraction.tags.clone(),
        relevance_score: extraction.relevance_score,
        media,
        context: ctx.build(),
    }
}
