//! Stack Overflow question-search crawler
//!
//! Queries the site search and extracts question summaries with their vote,
//! answer, and view counts. View counts above a thousand are abbreviated
//! ("1.2k"). Every item is content-like.

use crate::model::{CrawlResult, RawItem, SourceId};
use crate::sources::{
    collapse_whitespace, merge_terms, parse_engagement, recognize_tags, selector, SourceContext,
    SourceCrawler,
};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use scraper::Html;
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://stackoverflow.com";

const MAX_QUERY_TERMS: usize = 3;

pub struct StackOverflowSearch {
    context: SourceContext,
    base_url: String,
}

impl StackOverflowSearch {
    pub fn new(context: SourceContext, base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { context, base_url }
    }

    fn search_url(&self, terms: &[String]) -> String {
        let query = terms.join(" ");
        format!("{}/search?q={}", self.base_url, urlencoding::encode(&query))
    }

    async fn crawl_inner(&self, domain: &str, keywords: &[String]) -> FetchResult<Vec<RawItem>> {
        let curated = self.context.curated_terms(domain);
        let terms = merge_terms(curated, keywords, MAX_QUERY_TERMS);
        let vocabulary: Vec<String> = curated.iter().chain(keywords.iter()).cloned().collect();

        let url = self.search_url(&terms);
        let body = self.context.client.fetch_page(&url).await?;

        let mut items = self.parse_results(&url, &body, domain, &vocabulary)?;
        items.truncate(self.context.max_items);
        Ok(items)
    }

    fn parse_results(
        &self,
        url: &str,
        body: &str,
        domain: &str,
        vocabulary: &[String],
    ) -> FetchResult<Vec<RawItem>> {
        let document = Html::parse_document(body);

        let list_selector = selector(url, "div.js-search-results, div#questions")?;
        let item_selector = selector(url, "div.s-post-summary")?;
        let title_selector = selector(url, "h3.s-post-summary--content-title a")?;
        let excerpt_selector = selector(url, "div.s-post-summary--content-excerpt")?;
        let stat_selector = selector(url, "div.s-post-summary--stats-item")?;
        let stat_number_selector = selector(url, "span.s-post-summary--stats-item-number")?;
        let stat_unit_selector = selector(url, "span.s-post-summary--stats-item-unit")?;
        let tag_selector = selector(url, "a.post-tag")?;

        let Some(list) = document.select(&list_selector).next() else {
            return Err(FetchError::Parse {
                url: url.to_string(),
                message: "search result list missing; page markup may have changed".to_string(),
            });
        };

        let mut items = Vec::new();
        for summary in list.select(&item_selector) {
            let Some(link) = summary.select(&title_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            let question_url = if href.starts_with("http") {
                href.to_string()
            } else {
                format!("{}{}", self.base_url, href)
            };

            let title = collapse_whitespace(&link.text().collect::<String>());
            let mut item = RawItem::new(SourceId::StackOverflow, question_url, title);
            item.domain = domain.to_string();

            item.snippet = summary
                .select(&excerpt_selector)
                .next()
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .unwrap_or_default();

            // Stats render as number + unit pairs ("26 votes", "1.2k views")
            for stat in summary.select(&stat_selector) {
                let number = stat
                    .select(&stat_number_selector)
                    .next()
                    .and_then(|el| parse_engagement(&el.text().collect::<String>()));
                let unit = stat
                    .select(&stat_unit_selector)
                    .next()
                    .map(|el| collapse_whitespace(&el.text().collect::<String>()).to_lowercase());

                if let (Some(number), Some(unit)) = (number, unit) {
                    let metric = match unit.as_str() {
                        "vote" | "votes" => "votes",
                        "answer" | "answers" => "answers",
                        "view" | "views" => "views",
                        _ => continue,
                    };
                    item.metrics.insert(metric.to_string(), number);
                }
            }

            // Question tags count toward keyword trends alongside the
            // recognized vocabulary
            let mut tags: Vec<String> = summary
                .select(&tag_selector)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty())
                .collect();

            let haystack = format!("{} {}", item.title, item.snippet);
            for tag in recognize_tags(&haystack, vocabulary) {
                if !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                    tags.push(tag);
                }
            }
            item.tags = tags;

            items.push(item);
        }

        Ok(items)
    }
}

#[async_trait]
impl SourceCrawler for StackOverflowSearch {
    fn id(&self) -> SourceId {
        SourceId::StackOverflow
    }

    async fn crawl(&self, domain: &str, keywords: &[String]) -> CrawlResult {
        let started = Instant::now();
        match self.crawl_inner(domain, keywords).await {
            Ok(items) => {
                tracing::info!(
                    source = "stackoverflow",
                    count = items.len(),
                    "crawl succeeded"
                );
                CrawlResult::ok(self.id(), items, started.elapsed())
            }
            Err(err) => {
                tracing::warn!(source = "stackoverflow", error = %err, "crawl failed");
                CrawlResult::failed(self.id(), format!("{}: {}", err.kind(), err), started.elapsed())
            }
        }
    }
}
