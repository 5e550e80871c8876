//! GitHub trending-listing crawler
//!
//! Fetches `/trending/<language>` pages and extracts repository rows. Every
//! item this source produces is project-like.

use crate::model::{CrawlResult, RawItem, SourceId};
use crate::sources::{
    collapse_whitespace, merge_terms, parse_engagement, recognize_tags, selector, SourceContext,
    SourceCrawler,
};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use scraper::Html;
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://github.com";

/// How many trending pages (one per resolved term) to fetch per crawl.
const MAX_PAGES: usize = 2;

pub struct GithubTrending {
    context: SourceContext,
    base_url: String,
}

impl GithubTrending {
    pub fn new(context: SourceContext, base_url: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Self { context, base_url }
    }

    /// One trending URL per resolved term; a bare `/trending` when the term
    /// set is empty.
    fn trending_urls(&self, terms: &[String]) -> Vec<String> {
        if terms.is_empty() {
            return vec![format!("{}/trending?since=daily", self.base_url)];
        }
        terms
            .iter()
            .take(MAX_PAGES)
            .map(|term| {
                format!(
                    "{}/trending/{}?since=daily",
                    self.base_url,
                    urlencoding::encode(&term.to_lowercase())
                )
            })
            .collect()
    }

    async fn crawl_inner(&self, domain: &str, keywords: &[String]) -> FetchResult<Vec<RawItem>> {
        let curated = self.context.curated_terms(domain);
        let terms = merge_terms(curated, keywords, MAX_PAGES);
        let vocabulary: Vec<String> = curated.iter().chain(keywords.iter()).cloned().collect();

        let mut items = Vec::new();
        for url in self.trending_urls(&terms) {
            let body = self.context.client.fetch_page(&url).await?;
            self.parse_listing(&url, &body, domain, &vocabulary, &mut items)?;
            if items.len() >= self.context.max_items {
                break;
            }
        }

        items.truncate(self.context.max_items);
        Ok(items)
    }

    fn parse_listing(
        &self,
        url: &str,
        body: &str,
        domain: &str,
        vocabulary: &[String],
        items: &mut Vec<RawItem>,
    ) -> FetchResult<()> {
        let document = Html::parse_document(body);

        let row_selector = selector(url, "article.Box-row")?;
        let title_selector = selector(url, "h2 a")?;
        let desc_selector = selector(url, "p")?;
        let stars_selector = selector(url, "a[href$='/stargazers']")?;
        let forks_selector = selector(url, "a[href$='/forks']")?;
        let lang_selector = selector(url, "span[itemprop='programmingLanguage']")?;

        let rows: Vec<_> = document.select(&row_selector).collect();
        if rows.is_empty() {
            return Err(FetchError::Parse {
                url: url.to_string(),
                message: "no trending repository rows matched; listing markup may have changed"
                    .to_string(),
            });
        }

        for row in rows {
            let Some(link) = row.select(&title_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };

            // "owner / name" with decorative whitespace collapsed
            let title = collapse_whitespace(&link.text().collect::<String>());
            let repo_url = format!("{}{}", self.base_url, href);

            let snippet = row
                .select(&desc_selector)
                .next()
                .map(|p| collapse_whitespace(&p.text().collect::<String>()))
                .unwrap_or_default();

            let mut item = RawItem::new(SourceId::Github, repo_url, title);
            item.snippet = snippet;
            item.domain = domain.to_string();

            if let Some(stars) = row
                .select(&stars_selector)
                .next()
                .and_then(|el| parse_engagement(&el.text().collect::<String>()))
            {
                item.metrics.insert("stars".to_string(), stars);
            }

            if let Some(forks) = row
                .select(&forks_selector)
                .next()
                .and_then(|el| parse_engagement(&el.text().collect::<String>()))
            {
                item.metrics.insert("forks".to_string(), forks);
            }

            if let Some(language) = row.select(&lang_selector).next() {
                let language = collapse_whitespace(&language.text().collect::<String>());
                if !language.is_empty() {
                    item.metadata.insert("language".to_string(), language);
                }
            }

            let haystack = format!("{} {}", item.title, item.snippet);
            item.tags = recognize_tags(&haystack, vocabulary);

            items.push(item);
        }

        Ok(())
    }
}

#[async_trait]
impl SourceCrawler for GithubTrending {
    fn id(&self) -> SourceId {
        SourceId::Github
    }

    async fn crawl(&self, domain: &str, keywords: &[String]) -> CrawlResult {
        let started = Instant::now();
        match self.crawl_inner(domain, keywords).await {
            Ok(items) => {
                tracing::info!(source = "github", count = items.len(), "crawl succeeded");
                CrawlResult::ok(self.id(), items, started.elapsed())
            }
            Err(err) => {
                tracing::warn!(source = "github", error = %err, "crawl failed");
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

    pub(crate) const TRENDING_FIXTURE: &str = r#"
<html><body>
  <article class="Box-row">
    <h2><a href="/redis/redis">redis /
      redis</a></h2>
    <p>Redis is an in-memory database that persists on disk.</p>
    <a href="/redis/redis/stargazers">65,432</a>
    <a href="/redis/redis/forks">24,000</a>
    <span itemprop="programmingLanguage">C</span>
  </article>
  <article class="Box-row">
    <h2><a href="/pallets/flask">pallets / flask</a></h2>
    <p>The Python micro framework for building web applications.</p>
    <a href="/pallets/flask/stargazers">1.2k</a>
    <span itemprop="programmingLanguage">Python</span>
  </article>
</body></html>
"#;

    fn test_crawler() -> GithubTrending {
        let stealth = Stealth::seeded(&StealthConfig::default(), 0, 0, 1);
        let client = FetchClient::new(&CrawlerConfig::default(), stealth).unwrap();
        let mut domains = BTreeMap::new();
        domains.insert("backend".to_string(), vec!["Python".to_string()]);
        let context = SourceContext {
            client: Arc::new(client),
            domains: Arc::new(domains),
            max_items: 20,
        };
        GithubTrending::new(context, None)
    }

    #[test]
    fn test_parse_listing_extracts_rows() {
        let crawler = test_crawler();
        let mut items = Vec::new();
        crawler
            .parse_listing(
                "https://github.com/trending",
                TRENDING_FIXTURE,
                "backend",
                &["Python".to_string(), "Redis".to_string()],
                &mut items,
            )
            .unwrap();

        assert_eq!(items.len(), 2);

        let redis = &items[0];
        assert_eq!(redis.title, "redis / redis");
        assert_eq!(redis.url, "https://github.com/redis/redis");
        assert_eq!(redis.metrics["stars"], 65_432.0);
        assert_eq!(redis.metrics["forks"], 24_000.0);
        assert_eq!(redis.metadata["language"], "C");
        assert_eq!(redis.domain, "backend");
        assert_eq!(redis.tags, vec!["Redis".to_string()]);

        let flask = &items[1];
        assert_eq!(flask.metrics["stars"], 1_200.0);
        assert_eq!(flask.tags, vec!["Python".to_string()]);
    }

    #[test]
    fn test_parse_listing_without_rows_is_drift() {
        let crawler = test_crawler();
        let mut items = Vec::new();
        let result = crawler.parse_listing(
            "https://github.com/trending",
            "<html><body><div>redesigned page</div></body></html>",
            "backend",
            &[],
            &mut items,
        );
        assert!(matches!(result.unwrap_err(), FetchError::Parse { .. }));
    }

    #[test]
    fn test_trending_urls_from_terms() {
        let crawler = test_crawler();
        let urls = crawler.trending_urls(&["Rust".to_string(), "Go".to_string()]);
        assert_eq!(
            urls,
            vec![
                "https://github.com/trending/rust?since=daily",
                "https://github.com/trending/go?since=daily",
            ]
        );
    }

    #[test]
    fn test_trending_urls_without_terms() {
        let crawler = test_crawler();
        let urls = crawler.trending_urls(&[]);
        assert_eq!(urls, vec!["https://github.com/trending?since=daily"]);
    }
}
