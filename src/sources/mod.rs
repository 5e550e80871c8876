//! Per-source crawler variants
//!
//! Each external source gets one crawler implementing [`SourceCrawler`].
//! Crawlers share the same shape: resolve the domain tag to curated search
//! terms, build request URLs, fetch through the shared [`FetchClient`],
//! parse listing markup with source-specific selectors, tag and truncate.
//! Fetch and parse failures never escape a crawler; they become failed
//! `CrawlResult`s.

mod csdn;
mod github;
mod numbers;
mod stackoverflow;

pub use csdn::CsdnSearch;
pub use github::GithubTrending;
pub use numbers::parse_engagement;
pub use stackoverflow::StackOverflowSearch;

use crate::client::FetchClient;
use crate::config::Config;
use crate::model::{CrawlResult, SourceId, SourceKind};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Domain tag -> curated keyword table, shared by all crawlers.
pub type DomainTable = BTreeMap<String, Vec<String>>;

/// The single capability every source variant implements.
#[async_trait]
pub trait SourceCrawler: Send + Sync {
    /// Stable identifier of this source.
    fn id(&self) -> SourceId;

    /// Declared classification of this source's items.
    fn kind(&self) -> SourceKind {
        self.id().kind()
    }

    /// Crawls this source for one (domain, keyword-set) pair.
    ///
    /// Never panics and never returns an error: failures are reported as
    /// `CrawlResult { success: false, .. }`.
    async fn crawl(&self, domain: &str, keywords: &[String]) -> CrawlResult;
}

/// Shared state handed to each crawler at construction.
#[derive(Clone)]
pub struct SourceContext {
    pub client: Arc<FetchClient>,
    pub domains: Arc<DomainTable>,
    pub max_items: usize,
}

impl SourceContext {
    /// Curated terms for a domain tag. The orchestrator validates the tag
    /// before dispatch, so a miss here yields an empty slice rather than an
    /// error.
    pub fn curated_terms(&self, domain: &str) -> &[String] {
        self.domains.get(domain).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Builds the enabled crawler set from configuration.
pub fn registry(config: &Config, client: Arc<FetchClient>) -> Vec<Arc<dyn SourceCrawler>> {
    let context = SourceContext {
        client,
        domains: Arc::new(config.domains.clone()),
        max_items: config.crawler.max_items,
    };

    let mut crawlers: Vec<Arc<dyn SourceCrawler>> = Vec::new();
    for source in config.sources.enabled() {
        let base_url = config.sources.base_url(source).map(str::to_string);
        match source {
            SourceId::Github => {
                crawlers.push(Arc::new(GithubTrending::new(context.clone(), base_url)));
            }
            SourceId::Csdn => {
                crawlers.push(Arc::new(CsdnSearch::new(context.clone(), base_url)));
            }
            SourceId::StackOverflow => {
                crawlers.push(Arc::new(StackOverflowSearch::new(
                    context.clone(),
                    base_url,
                )));
            }
        }
    }
    crawlers
}

/// Merges curated terms and caller keywords into query terms, preserving
/// curated-first order, dropping case-insensitive duplicates, and keeping
/// at most `limit` terms.
pub(crate) fn merge_terms(curated: &[String], keywords: &[String], limit: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut terms = Vec::new();

    for term in curated.iter().chain(keywords.iter()) {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if seen.contains(&lower) {
            continue;
        }
        seen.push(lower);
        terms.push(trimmed.to_string());
        if terms.len() == limit {
            break;
        }
    }

    terms
}

/// Parses a CSS selector, mapping failure to a parse error for `url`.
///
/// Selector strings are compile-time constants, so a failure here means a
/// typo, not markup drift; it is still reported through the same channel.
pub(crate) fn selector(url: &str, css: &str) -> crate::FetchResult<scraper::Selector> {
    scraper::Selector::parse(css).map_err(|_| crate::FetchError::Parse {
        url: url.to_string(),
        message: format!("invalid selector '{}'", css),
    })
}

/// Collapses runs of whitespace (including newlines from pretty-printed
/// markup) into single spaces.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Technology keywords from `vocabulary` that appear in `text`,
/// case-insensitively, in vocabulary order.
pub(crate) fn recognize_tags(text: &str, vocabulary: &[String]) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut tags = Vec::new();
    for word in vocabulary {
        let needle = word.trim().to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if haystack.contains(&needle) && !tags.contains(word) {
            tags.push(word.clone());
        }
    }
    tags
}
