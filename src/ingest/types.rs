// src/ingest/types.rs
use anyhow::Result;

use crate::record::NewsItem;

/// Source of raw news items (already mapped into `NewsItem`, not yet filtered).
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<NewsItem>>;
    fn name(&self) -> &'static str;
}
