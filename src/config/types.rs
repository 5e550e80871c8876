use crate::model::SourceId;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Main configuration structure for TrendScout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub stealth: StealthConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    /// Domain tag -> curated keyword list used to build source queries
    #[serde(default)]
    pub domains: BTreeMap<String, Vec<String>>,
}

/// Crawler behavior configuration. Immutable for the duration of one
/// orchestration call.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum items kept per source
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry attempts for transient failures
    #[serde(rename = "retry-times", default = "default_retry_times")]
    pub retry_times: u32,

    /// Lower bound of the randomized pre-request delay (milliseconds)
    #[serde(rename = "delay-min-ms", default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the randomized pre-request delay (milliseconds)
    #[serde(rename = "delay-max-ms", default = "default_delay_max_ms")]
    pub delay_max_ms: u64,

    /// Global deadline for one orchestration call (seconds)
    #[serde(rename = "global-timeout-secs", default = "default_global_timeout_secs")]
    pub global_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            timeout_secs: default_timeout_secs(),
            retry_times: default_retry_times(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            global_timeout_secs: default_global_timeout_secs(),
        }
    }
}

/// Crawl-result cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Time-to-live for cached crawl results (seconds)
    #[serde(rename = "ttl-secs", default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Anti-detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StealthConfig {
    /// Rotating pool of real browser user-agent strings
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            user_agents: default_user_agents(),
        }
    }
}

/// Engagement score weighting. Metrics not listed weigh 1.0, so an empty
/// table means an unweighted sum.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: HashMap<String, f64>,
}

impl ScoringConfig {
    pub fn weight(&self, metric: &str) -> f64 {
        self.weights.get(metric).copied().unwrap_or(1.0)
    }
}

/// Per-source enable flags and base-URL overrides.
///
/// Base URLs default to the real sites; overriding them points a crawler at
/// a staging mirror or a mock server in tests.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_true")]
    pub github: bool,

    #[serde(default = "default_true")]
    pub csdn: bool,

    #[serde(default = "default_true")]
    pub stackoverflow: bool,

    #[serde(rename = "base-urls", default)]
    pub base_urls: BTreeMap<String, String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            github: true,
            csdn: true,
            stackoverflow: true,
            base_urls: BTreeMap::new(),
        }
    }
}

impl SourcesConfig {
    /// Whether a source is enabled.
    pub fn is_enabled(&self, source: SourceId) -> bool {
        match source {
            SourceId::Github => self.github,
            SourceId::Csdn => self.csdn,
            SourceId::StackOverflow => self.stackoverflow,
        }
    }

    /// The enabled subset of all known sources, in registry order.
    pub fn enabled(&self) -> Vec<SourceId> {
        SourceId::ALL
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }

    /// Base URL override for a source, if configured.
    pub fn base_url(&self, source: SourceId) -> Option<&str> {
        self.base_urls.get(source.as_str()).map(String::as_str)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_items() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_times() -> u32 {
    3
}

fn default_delay_min_ms() -> u64 {
    200
}

fn default_delay_max_ms() -> u64 {
    1500
}

fn default_global_timeout_secs() -> u64 {
    60
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_user_agents() -> Vec<String> {
    crate::client::DEFAULT_USER_AGENTS
        .iter()
        .map(|ua| ua.to_string())
        .collect()
}
