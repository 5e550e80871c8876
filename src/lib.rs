//! TrendScout: a stealthy tech-trend crawler and aggregator
//!
//! This crate crawls trending-project listings and technical article/Q&A
//! search results from several non-cooperative sources, then merges the raw
//! items into one deduplicated, ranked trend summary for downstream report
//! generation.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod sources;
pub mod url;

use thiserror::Error;

/// Main error type for TrendScout operations
#[derive(Debug, Error)]
pub enum TrendError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown domain tag: {domain}")]
    UnknownDomain { domain: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetch-layer errors, classified so the caller can tell "denied" from
/// "broken" from "needs a browser".
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection-level failure or an unexpected HTTP status.
    #[error("Network error for {url}: {reason}")]
    Network {
        url: String,
        reason: String,
        status: Option<u16>,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    /// Anti-bot rejection (403/429, or a content-less 200). Never retried.
    #[error("Blocked by {url} (HTTP {status}): anti-bot rejection")]
    Blocked { url: String, status: u16 },

    /// The page exists but its content is only revealed by client-side
    /// script execution. No amount of retrying or header tuning helps.
    #[error("Page at {url} requires script execution to render")]
    RenderRequired { url: String },

    /// Expected markup structure is no longer present (schema drift).
    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

impl FetchError {
    /// Whether retrying this failure could plausibly change the outcome.
    ///
    /// Timeouts, connection failures, and 5xx responses are transient; a
    /// 403, a render-required page, or markup drift will fail the same way
    /// on every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } => true,
            FetchError::Network { status, .. } => match status {
                Some(code) => *code >= 500,
                None => true,
            },
            FetchError::Blocked { .. }
            | FetchError::RenderRequired { .. }
            | FetchError::Parse { .. } => false,
        }
    }

    /// Short diagnostic tag used in crawl results and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Blocked { .. } => "blocked",
            FetchError::RenderRequired { .. } => "render-required",
            FetchError::Parse { .. } => "parse",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for TrendScout operations
pub type Result<T> = std::result::Result<T, TrendError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{CrawlResult, RawItem, SourceId, SourceKind, TrendEntry, TrendSummary};
pub use orchestrator::{CrawlReport, Orchestrator};
pub use url::normalize_url;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        let err = FetchError::Timeout {
            url: "https://example.com".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = FetchError::Network {
            url: "https://example.com".to_string(),
            reason: "HTTP 503".to_string(),
            status: Some(503),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_error_is_not_retryable() {
        let err = FetchError::Network {
            url: "https://example.com".to_string(),
            reason: "HTTP 404".to_string(),
            status: Some(404),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_blocked_is_not_retryable() {
        let err = FetchError::Blocked {
            url: "https://example.com".to_string(),
            status: 403,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_render_required_is_not_retryable() {
        let err = FetchError::RenderRequired {
            url: "https://example.com".to_string(),
        };
        assert!(!err.is_retryable());
    }
}
