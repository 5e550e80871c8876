//! Fan-out/fan-in crawl orchestration
//!
//! One task per enabled source runs concurrently in a `JoinSet`. The join
//! loop collects results until every task finishes or the global deadline
//! fires, whichever comes first; stragglers are aborted and their partial
//! work discarded. A failing source never aborts the others, and an
//! all-sources-failed run still returns a structurally valid empty summary.

use crate::aggregate::aggregate;
use crate::client::{CrawlCache, FetchClient, Stealth};
use crate::config::{validate, Config};
use crate::model::{CrawlResult, RawItem, SourceId, TrendSummary};
use crate::sources::{registry, SourceCrawler};
use crate::{Result, TrendError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Per-source outcome included in the crawl report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: SourceId,
    pub success: bool,
    pub count: usize,
    pub error: Option<String>,
    pub from_cache: bool,
    pub elapsed_ms: u64,
}

/// Everything one orchestration call produces: the aggregated summary plus
/// per-source diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub domain: String,
    pub keywords: Vec<String>,
    pub summary: TrendSummary,
    pub sources: Vec<SourceOutcome>,
}

pub struct Orchestrator {
    config: Arc<Config>,
    crawlers: Vec<Arc<dyn SourceCrawler>>,
    cache: Arc<CrawlCache>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("crawlers", &self.crawlers.len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Builds the orchestrator, validating the configuration first.
    ///
    /// Misuse at this boundary (empty user-agent pool, no sources enabled,
    /// bad base URLs) raises here, before any network activity.
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let stealth = Stealth::new(
            &config.stealth,
            config.crawler.delay_min_ms,
            config.crawler.delay_max_ms,
        );
        let client = Arc::new(FetchClient::new(&config.crawler, stealth)?);
        let cache = Arc::new(CrawlCache::new(
            config.cache.enabled,
            Duration::from_secs(config.cache.ttl_secs),
        ));
        let crawlers = registry(&config, client);

        Ok(Self {
            config: Arc::new(config),
            crawlers,
            cache,
        })
    }

    /// The enabled sources, in registry order.
    pub fn sources(&self) -> Vec<SourceId> {
        self.crawlers.iter().map(|c| c.id()).collect()
    }

    /// Crawls all enabled sources for one (domain, keyword-set) pair and
    /// aggregates whatever succeeded.
    ///
    /// Only boundary misuse errors here: an unknown domain tag fails
    /// synchronously before any network activity. Per-source failures are
    /// data, not errors.
    ///
    /// # Arguments
    ///
    /// * `domain` - A domain tag declared in the `[domains]` configuration
    /// * `keywords` - Extra search terms merged with the domain's curated terms
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Aggregated summary plus one outcome per source
    /// * `Err(TrendError::UnknownDomain)` - The domain tag is not configured
    pub async fn run(&self, domain: &str, keywords: &[String]) -> Result<CrawlReport> {
        if !self.config.domains.contains_key(domain) {
            return Err(TrendError::UnknownDomain {
                domain: domain.to_string(),
            });
        }

        let global_timeout = Duration::from_secs(self.config.crawler.global_timeout_secs);
        let deadline = Instant::now() + global_timeout;

        tracing::info!(
            domain,
            ?keywords,
            sources = self.crawlers.len(),
            timeout_secs = self.config.crawler.global_timeout_secs,
            "dispatching crawl"
        );

        let started = std::time::Instant::now();
        let mut tasks: JoinSet<(SourceId, bool, CrawlResult)> = JoinSet::new();
        let mut sources_by_task: HashMap<tokio::task::Id, SourceId> = HashMap::new();
        for crawler in &self.crawlers {
            let source = crawler.id();
            let crawler = Arc::clone(crawler);
            let cache = Arc::clone(&self.cache);
            let domain = domain.to_string();
            let keywords = keywords.to_vec();

            let handle = tasks.spawn(async move {
                let key = CrawlCache::key(source, &domain, &keywords);

                if let Some(cached) = cache.get(&key) {
                    return (source, true, cached);
                }

                let result = crawler.crawl(&domain, &keywords).await;
                cache.store(key, result.clone());
                (source, false, result)
            });
            sources_by_task.insert(handle.id(), source);
        }

        let mut collected: Vec<(SourceId, bool, CrawlResult)> = Vec::new();
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok(entry))) => collected.push(entry),
                Ok(Some(Err(join_err))) => {
                    // Crawlers convert their own failures into data, and
                    // aborts only happen after this loop exits, so a join
                    // error here means the task panicked.
                    tracing::error!(error = %join_err, "crawl task panicked");
                    if let Some(&source) = sources_by_task.get(&join_err.id()) {
                        collected.push((
                            source,
                            false,
                            CrawlResult::failed(
                                source,
                                "task panicked before producing a result",
                                started.elapsed(),
                            ),
                        ));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    let abandoned = tasks.len();
                    tasks.abort_all();
                    tracing::warn!(
                        abandoned,
                        timeout_secs = self.config.crawler.global_timeout_secs,
                        "global timeout elapsed, abandoning unfinished sources"
                    );
                    break;
                }
            }
        }

        // Placeholders for tasks abandoned at the deadline, so every
        // enabled source appears in the report.
        for crawler in &self.crawlers {
            let source = crawler.id();
            if !collected.iter().any(|(s, _, _)| *s == source) {
                collected.push((
                    source,
                    false,
                    CrawlResult::failed(
                        source,
                        "abandoned: global timeout elapsed before completion",
                        global_timeout,
                    ),
                ));
            }
        }

        // Registry order keeps reports stable regardless of completion order
        collected.sort_by_key(|(source, _, _)| {
            self.crawlers.iter().position(|c| c.id() == *source)
        });

        let mut items: Vec<RawItem> = Vec::new();
        let mut outcomes = Vec::new();
        for (source, from_cache, result) in collected {
            outcomes.push(SourceOutcome {
                source,
                success: result.success,
                count: result.count(),
                error: result.error.clone(),
                from_cache,
                elapsed_ms: result.elapsed.as_millis() as u64,
            });
            if result.success {
                items.extend(result.items);
            }
        }

        self.cache.evict_expired();

        let summary = aggregate(items, &self.config.scoring);

        tracing::info!(
            projects = summary.projects.len(),
            articles = summary.articles.len(),
            failed_sources = outcomes.iter().filter(|o| !o.success).count(),
            "crawl finished"
        );

        Ok(CrawlReport {
            domain: domain.to_string(),
            keywords: keywords.to_vec(),
            summary,
            sources: outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, CrawlerConfig, SourcesConfig, StealthConfig};
    use std::collections::BTreeMap;

    fn test_config() -> Config {
        let mut domains = BTreeMap::new();
        domains.insert("backend".to_string(), vec!["Python".to_string()]);
        Config {
            crawler: CrawlerConfig {
                delay_min_ms: 0,
                delay_max_ms: 0,
                ..CrawlerConfig::default()
            },
            cache: CacheConfig::default(),
            stealth: StealthConfig::default(),
            scoring: Default::default(),
            sources: SourcesConfig::default(),
            domains,
        }
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = test_config();
        config.stealth.user_agents.clear();
        let result = Orchestrator::new(config);
        assert!(matches!(result.unwrap_err(), TrendError::Config(_)));
    }

    struct ExplodingCrawler;

    #[async_trait::async_trait]
    impl SourceCrawler for ExplodingCrawler {
        fn id(&self) -> SourceId {
            SourceId::Github
        }

        async fn crawl(&self, _domain: &str, _keywords: &[String]) -> CrawlResult {
            panic!("selector table corrupted");
        }
    }

    #[tokio::test]
    async fn test_panicking_task_reported_as_panic() {
        let orchestrator = Orchestrator {
            config: Arc::new(test_config()),
            crawlers: vec![Arc::new(ExplodingCrawler)],
            cache: Arc::new(CrawlCache::disabled()),
        };

        let report = orchestrator.run("backend", &[]).await.unwrap();

        assert_eq!(report.sources.len(), 1);
        assert!(!report.sources[0].success);
        let reason = report.sources[0].error.as_deref().unwrap();
        assert!(reason.contains("panicked"), "got reason: {}", reason);
        assert!(!reason.contains("timeout"));
        assert!(report.summary.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_domain_fails_synchronously() {
        let orchestrator = Orchestrator::new(test_config()).unwrap();
        let result = orchestrator.run("no-such-domain", &[]).await;
        assert!(matches!(
            result.unwrap_err(),
            TrendError::UnknownDomain { .. }
        ));
    }

    #[test]
    fn test_registry_respects_enable_flags() {
        let mut config = test_config();
        config.sources.csdn = false;
        let orchestrator = Orchestrator::new(config).unwrap();
        assert_eq!(
            orchestrator.sources(),
            vec![SourceId::Github, SourceId::StackOverflow]
        );
    }
}
