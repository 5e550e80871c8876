//! Core data types shared across the crawl and aggregation stages
//!
//! The types here are deliberately plain: crawlers produce [`RawItem`]s
//! wrapped in [`CrawlResult`]s, and the aggregator turns a merged item list
//! into a [`TrendSummary`]. Nothing in this module touches the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// The closed set of crawlable sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// GitHub trending repository listing
    Github,
    /// CSDN article search results
    Csdn,
    /// Stack Overflow question search results
    StackOverflow,
}

impl SourceId {
    /// All known sources, in registry order.
    pub const ALL: [SourceId; 3] = [SourceId::Github, SourceId::Csdn, SourceId::StackOverflow];

    /// Declared classification of everything this source produces.
    ///
    /// Classification is a property of the source, not of item content:
    /// GitHub trending rows are always project-like, search results from
    /// the article/Q&A sources are always content-like.
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceId::Github => SourceKind::Project,
            SourceId::Csdn | SourceId::StackOverflow => SourceKind::Content,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Github => "github",
            SourceId::Csdn => "csdn",
            SourceId::StackOverflow => "stackoverflow",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a source yields project listings or written content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Project,
    Content,
}

/// One normalized unit extracted from a source page: a trending project or
/// an article/Q&A result.
///
/// The canonical URL is the sole identity key; two items with the same
/// normalized URL describe the same underlying entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawItem {
    /// Which source produced this item
    pub source: SourceId,

    /// Canonical URL, used as the dedup key after normalization
    pub url: String,

    /// Item title (repository name, article title, question title)
    pub title: String,

    /// Short description or excerpt; may be empty
    pub snippet: String,

    /// The domain tag this item was crawled for (e.g. "backend")
    pub domain: String,

    /// Technology keywords recognized in the title/snippet
    pub tags: Vec<String>,

    /// Engagement metrics by name (stars, views, likes, ...). BTreeMap so
    /// serialized output is stable across runs.
    pub metrics: BTreeMap<String, f64>,

    /// Free-form source-specific metadata (language, author, ...)
    pub metadata: BTreeMap<String, String>,

    /// When this item was fetched
    pub fetched_at: DateTime<Utc>,
}

impl RawItem {
    pub fn new(source: SourceId, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source,
            url: url.into(),
            title: title.into(),
            snippet: String::new(),
            domain: String::new(),
            tags: Vec::new(),
            metrics: BTreeMap::new(),
            metadata: BTreeMap::new(),
            fetched_at: Utc::now(),
        }
    }
}

/// Outcome of one source crawl.
///
/// Invariant: `success == false` implies `items` is empty. The reverse does
/// not hold; a source can legitimately match nothing and still succeed.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Which source this result came from
    pub source: SourceId,

    /// The extracted items (empty on failure)
    pub items: Vec<RawItem>,

    /// Whether the crawl completed
    pub success: bool,

    /// Failure reason when `success` is false
    pub error: Option<String>,

    /// How long the crawl took
    pub elapsed: Duration,
}

impl CrawlResult {
    /// A successful result carrying `items`.
    pub fn ok(source: SourceId, items: Vec<RawItem>, elapsed: Duration) -> Self {
        Self {
            source,
            items,
            success: true,
            error: None,
            elapsed,
        }
    }

    /// A failed result with a diagnostic reason and zero items.
    pub fn failed(source: SourceId, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            source,
            items: Vec::new(),
            success: false,
            error: Some(error.into()),
            elapsed,
        }
    }

    /// Number of items carried by this result.
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// One ranked entry in the final summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEntry {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: SourceId,
    pub domain: String,
    pub tags: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    /// Composite engagement score used for ranking
    pub score: f64,
}

/// The aggregated, deduplicated, ranked output consumed by downstream
/// report generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Project-like entries (trending repositories), ranked by score
    pub projects: Vec<TrendEntry>,

    /// Content-like entries (articles, questions), ranked by score
    pub articles: Vec<TrendEntry>,

    /// (term, frequency) pairs over tags and title tokens, descending
    pub keyword_trends: Vec<(String, usize)>,

    /// (domain tag, item count) pairs, descending
    pub topic_trends: Vec<(String, usize)>,
}

impl TrendSummary {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.articles.is_empty()
    }
}
