//! CSDN article-search crawler
//!
//! Queries the CSDN blog search and extracts article results. Engagement
//! counts on CSDN use CJK multiplier suffixes ("1.2万阅读"), which
//! [`parse_engagement`] handles. Every item is content-like.

use crate::model::{CrawlResult, RawItem, SourceId};
use crate::sources::{
    collapse_whitespace, merge_terms, parse_engagement, recognize_tags, selector, SourceContext,
    SourceCrawler,
};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use scraper::Html;
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://so.csdn.net";

/// How many query terms make it into the search string.
const MAX_QUERY_TERMS: usize = 3;

pub struct CsdnSearch {
    context: SourceContext,
    base_url: String,
}

impl CsdnSearch {
    pub fn new(context: SourceContext, base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { context, base_url }
    }

    fn search_url(&self, terms: &[String]) -> String {
        let query = terms.join(" ");
        format!(
            "{}/so/search?q={}&t=blog",
            self.base_url,
            urlencoding::encode(&query)
        )
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

        let container_selector = selector(url, "div.search-list-con")?;
        let item_selector = selector(url, "div.search-item")?;
        let title_selector = selector(url, "a.item-title")?;
        let desc_selector = selector(url, "p.item-desc")?;
        let views_selector = selector(url, "span.view-num")?;
        let likes_selector = selector(url, "span.like-num")?;

        // The result container must exist even when a query matches nothing;
        // its absence means the page layout drifted.
        let Some(container) = document.select(&container_selector).next() else {
            return Err(FetchError::Parse {
                url: url.to_string(),
                message: "search result container missing; page markup may have changed"
                    .to_string(),
            });
        };

        let mut items = Vec::new();
        for result in container.select(&item_selector) {
            let Some(link) = result.select(&title_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            let title = collapse_whitespace(&link.text().collect::<String>());
            let mut item = RawItem::new(SourceId::Csdn, href.to_string(), title);
            item.domain = domain.to_string();

            item.snippet = result
                .select(&desc_selector)
                .next()
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .unwrap_or_default();

            if let Some(views) = result
                .select(&views_selector)
                .next()
                .and_then(|el| parse_engagement(&el.text().collect::<String>()))
            {
                item.metrics.insert("views".to_string(), views);
            }

            if let Some(likes) = result
                .select(&likes_selector)
                .next()
                .and_then(|el| parse_engagement(&el.text().collect::<String>()))
            {
                item.metrics.insert("likes".to_string(), likes);
            }

            let haystack = format!("{} {}", item.title, item.snippet);
            item.tags = recognize_tags(&haystack, vocabulary);

            items.push(item);
        }

        Ok(items)
    }
}

#[async_trait]
impl SourceCrawler for CsdnSearch {
    fn id(&self) -> SourceId {
        SourceId::Csdn
    }

    async fn crawl(&self, domain: &str, keywords: &[String]) -> CrawlResult {
        let started = Instant::now();
        match self.crawl_inner(domain, keywords).await {
            Ok(items) => {
                tracing::info!(source = "csdn", count = items.len(), "crawl succeeded");
                CrawlResult::ok(self.id(), items, started.elapsed())
            }
            Err(err) => {
                tracing::warn!(source = "csdn", error = %err, "crawl failed");
                CrawlResult::failed(self.id(), format!("{}: {}", err.kind(), err), started.elapsed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FetchClient, Stealth};
    use crate::config::{CrawlerConfig, StealthConfig};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    const SEARCH_FIXTURE: &str = r#"
<html><body>
<div class="search-list-con">
  <div class="search-item">
    <a class="item-title" href="https://blog.csdn.net/u1/article/details/100">Redis 分布式锁实战</a>
    <p class="item-desc">基于 Redis 的分布式锁实现与踩坑记录。</p>
    <span class="view-num">1.2万阅读</span>
    <span class="like-num">356点赞</span>
  </div>
  <div class="search-item">
    <a class="item-title" href="https://blog.csdn.net/u2/article/details/200">Python 异步编程入门</a>
    <p class="item-desc">asyncio 从零开始。</p>
    <span class="view-num">3,456阅读</span>
  </div>
</div>
</body></html>
"#;

    fn test_crawler(max_items: usize) -> CsdnSearch {
        let stealth = Stealth::seeded(&StealthConfig::default(), 0, 0, 1);
        let client = FetchClient::new(&CrawlerConfig::default(), stealth).unwrap();
        let mut domains = BTreeMap::new();
        domains.insert(
            "backend".to_string(),
            vec!["Python".to_string(), "Redis".to_string()],
        );
        let context = SourceContext {
            client: Arc::new(client),
            domains: Arc::new(domains),
            max_items,
        };
        CsdnSearch::new(context, None)
    }

    #[test]
    fn test_search_url_encodes_query() {
        let crawler = test_crawler(20);
        let url = crawler.search_url(&["Python".to_string(), "Redis".to_string()]);
        assert_eq!(
            url,
            "https://so.csdn.net/so/search?q=Python%20Redis&t=blog"
        );
    }

    #[test]
    fn test_parse_results() {
        let crawler = test_crawler(20);
        let items = crawler
            .parse_results(
                "https://so.csdn.net/so/search?q=x",
                SEARCH_FIXTURE,
                "backend",
                &["Python".to_string(), "Redis".to_string()],
            )
            .unwrap();

        assert_eq!(items.len(), 2);

        let lock_article = &items[0];
        assert_eq!(lock_article.title, "Redis 分布式锁实战");
        assert_eq!(lock_article.metrics["views"], 12_000.0);
        assert_eq!(lock_article.metrics["likes"], 356.0);
        assert_eq!(lock_article.tags, vec!["Redis".to_string()]);

        let async_article = &items[1];
        assert_eq!(async_article.metrics["views"], 3_456.0);
        assert!(!async_article.metrics.contains_key("likes"));
        assert_eq!(async_article.tags, vec!["Python".to_string()]);
    }

    #[test]
    fn test_empty_result_list_is_success() {
        let crawler = test_crawler(20);
        let body = r#"<html><body><div class="search-list-con"></div><p>no results</p></body></html>"#;
        let items = crawler
            .parse_results("https://so.csdn.net/so/search?q=x", body, "backend", &[])
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_container_is_drift() {
        let crawler = test_crawler(20);
        let body = "<html><body><div>redesigned</div></body></html>";
        let result =
            crawler.parse_results("https://so.csdn.net/so/search?q=x", body, "backend", &[]);
        assert!(matches!(result.unwrap_err(), FetchError::Parse { .. }));
    }

}
