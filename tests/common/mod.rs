// tests/common/mod.rs
//
// Shared mock sources for pipeline-level tests. Every mock counts its calls.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use news_enricher::collectors::{
    GeocodeSource, ImageSearch, KnowledgeSource, SearchCounts, SocialPost, SocialSearch, Sources,
    VideoSearch, WebSearch,
};
use news_enricher::NewsItem;

pub fn news_item(title: &str) -> NewsItem {
    NewsItem {
        id: Some(format!("id-{title}")),
        title: title.to_string(),
        body: "Lorem ipsum dolor sit amet. ".repeat(18),
        source_url: format!("https://news.example.test/{title}"),
        publisher: "Example Times".to_string(),
        published_at: "2025-05-01T08:00:00Z".to_string(),
        ingested_at: None,
    }
}

#[derive(Default)]
pub struct Calls(AtomicUsize);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct MockImages {
    pub url: Option<String>,
    pub fail: bool,
    pub calls: Calls,
}

#[async_trait]
impl ImageSearch for MockImages {
    async fn first_image(&self, _query: &str) -> Result<Option<String>> {
        self.calls.hit();
        if self.fail {
            return Err(anyhow!("images down"));
        }
        Ok(self.url.clone())
    }
    fn name(&self) -> &'static str {
        "mock-images"
    }
}

pub struct MockVideos {
    pub url: Option<String>,
    pub fail: bool,
    pub calls: Calls,
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl VideoSearch for MockVideos {
    async fn first_video(&self, query: &str) -> Result<Option<String>> {
        self.calls.hit();
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(anyhow!("videos down"));
        }
        Ok(self.url.clone())
    }
    fn name(&self) -> &'static str {
        "mock-videos"
    }
}

pub struct MockKnowledge {
    pub extract: Option<String>,
    pub fail: bool,
    pub calls: Calls,
}

#[async_trait]
impl KnowledgeSource for MockKnowledge {
    async fn extract(&self, _title: &str) -> Result<Option<String>> {
        self.calls.hit();
        if self.fail {
            return Err(anyhow!("wiki down"));
        }
        Ok(self.extract.clone())
    }
    fn name(&self) -> &'static str {
        "mock-wiki"
    }
}

pub struct MockGeocoder {
    pub coords: Option<(f64, f64)>,
    pub calls: Calls,
    /// tokio clock readings at each call
    pub issued_at: Mutex<Vec<tokio::time::Instant>>,
}

#[async_trait]
impl GeocodeSource for MockGeocoder {
    async fn lookup(&self, _location: &str) -> Result<Option<(f64, f64)>> {
        self.calls.hit();
        self.issued_at.lock().unwrap().push(tokio::time::Instant::now());
        Ok(self.coords)
    }
    fn name(&self) -> &'static str {
        "mock-geo"
    }
}

pub struct MockSearch {
    /// (current window, previous window); `None` = fetch error
    pub current: Option<SearchCounts>,
    pub previous: Option<SearchCounts>,
    pub calls: Calls,
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn counts(&self, _query: &str, window: &str) -> Result<SearchCounts> {
        self.calls.hit();
        let pick = if window == "qdr:w" {
            self.current
        } else {
            self.previous
        };
        pick.ok_or_else(|| anyhow!("search down for {window}"))
    }
    fn name(&self) -> &'static str {
        "mock-search"
    }
}

pub struct MockSocial {
    pub posts: Vec<SocialPost>,
    pub fail: bool,
    pub calls: Calls,
}

#[async_trait]
impl SocialSearch for MockSocial {
    async fn recent_posts(&self, _topic: &str) -> Result<Vec<SocialPost>> {
        self.calls.hit();
        if self.fail {
            return Err(anyhow!("x down"));
        }
        Ok(self.posts.clone())
    }
    fn name(&self) -> &'static str {
        "mock-x"
    }
}

pub fn post(text: &str, lang: &str) -> SocialPost {
    SocialPost {
        text: text.to_string(),
        lang: Some(lang.to_string()),
    }
}

/// Mocks wired with "everything found" defaults; tweak fields before `sources()`.
pub struct MockSet {
    pub images: Arc<MockImages>,
    pub videos: Arc<MockVideos>,
    pub knowledge: Arc<MockKnowledge>,
    pub geocoder: Arc<MockGeocoder>,
    pub search: Arc<MockSearch>,
    pub social: Arc<MockSocial>,
}

impl MockSet {
    pub fn found() -> Self {
        Self::build(false)
    }

    /// Every source errors or finds nothing.
    pub fn failing() -> Self {
        Self::build(true)
    }

    fn build(fail: bool) -> Self {
        Self {
            images: Arc::new(MockImages {
                url: (!fail).then(|| "https://img.example.test/1.jpg".to_string()),
                fail,
                calls: Calls::default(),
            }),
            videos: Arc::new(MockVideos {
                url: (!fail).then(|| "https://www.youtube.com/watch?v=abc".to_string()),
                fail,
                calls: Calls::default(),
                queries: Mutex::new(Vec::new()),
            }),
            knowledge: Arc::new(MockKnowledge {
                extract: (!fail).then(|| "Lagos  is the\nlargest city in Nigeria.".to_string()),
                fail,
                calls: Calls::default(),
            }),
            geocoder: Arc::new(MockGeocoder {
                coords: (!fail).then_some((6.4550, 3.3941)),
                calls: Calls::default(),
                issued_at: Mutex::new(Vec::new()),
            }),
            search: Arc::new(MockSearch {
                current: (!fail).then_some(SearchCounts {
                    organic: 10,
                    related: 10,
                }),
                previous: (!fail).then_some(SearchCounts {
                    organic: 8,
                    related: 4,
                }),
                calls: Calls::default(),
            }),
            social: Arc::new(MockSocial {
                posts: vec![post("great news", "en"), post("bonne nouvelle", "fr")],
                fail,
                calls: Calls::default(),
            }),
        }
    }

    pub fn sources(&self) -> Sources {
        Sources {
            images: self.images.clone(),
            videos: self.videos.clone(),
            knowledge: self.knowledge.clone(),
            geocoder: self.geocoder.clone(),
            search: self.search.clone(),
            social: self.social.clone(),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.images.calls.get()
            + self.videos.calls.get()
            + self.knowledge.calls.get()
            + self.geocoder.calls.get()
            + self.search.calls.get()
            + self.social.calls.get()
    }
}
