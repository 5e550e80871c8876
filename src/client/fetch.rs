//! Rate-limited HTTP fetch client
//!
//! All source crawlers go through this client. Each attempt waits a
//! randomized stealth delay, sends a browser-like header set, and classifies
//! the outcome into the fetch error taxonomy. Transient failures are retried
//! with exponential backoff under one shared [`RetryPolicy`]; permanent
//! failures (anti-bot rejections, script-only pages) are returned
//! immediately because retrying cannot change the outcome.

use crate::client::retry::RetryPolicy;
use crate::client::stealth::Stealth;
use crate::config::CrawlerConfig;
use crate::{FetchError, FetchResult};
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// HTTP client with stealth fingerprints, randomized delays, and uniform
/// retry handling.
pub struct FetchClient {
    http: Client,
    stealth: Stealth,
    retry: RetryPolicy,
}

/// Builds the underlying reqwest client.
///
/// Redirects are followed (trending listings redirect across locales);
/// HTTPS is not forced so tests can point sources at a plain-HTTP mock.
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

impl FetchClient {
    pub fn new(config: &CrawlerConfig, stealth: Stealth) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(config)?,
            stealth,
            retry: RetryPolicy::with_retries(config.retry_times),
        })
    }

    /// Client with an explicit retry policy (used by tests to drop jitter).
    pub fn with_policy(
        config: &CrawlerConfig,
        stealth: Stealth,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(config)?,
            stealth,
            retry,
        })
    }

    /// Fetches a page body, retrying transient failures.
    ///
    /// Each attempt carries randomized stealth headers, and retries wait
    /// out a strictly increasing backoff delay. On final failure the typed
    /// error is returned rather than raised past the crawler boundary, so
    /// crawlers can turn it into a failed `CrawlResult`.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute HTTP(S) URL to fetch
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The response body with usable page content
    /// * `Err(FetchError)` - Classified failure after the retry budget is spent
    pub async fn fetch_page(&self, url: &str) -> FetchResult<String> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Parse {
            url: url.to_string(),
            message: format!("invalid request URL: {}", e),
        })?;

        let mut attempt: u32 = 0;
        let mut schedule = self.retry.schedule();
        loop {
            tokio::time::sleep(self.stealth.delay()).await;

            match self.attempt(url, &parsed).await {
                Ok(body) => return Ok(body),
                Err(err) if self.retry.should_retry(attempt, &err) => {
                    attempt += 1;
                    let backoff = schedule.next_delay(attempt);
                    tracing::warn!(
                        url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient fetch failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    tracing::debug!(url, kind = err.kind(), "fetch failed terminally");
                    return Err(err);
                }
            }
        }
    }

    async fn attempt(&self, url: &str, parsed: &Url) -> FetchResult<String> {
        let response = self
            .http
            .get(url)
            .headers(self.stealth.headers(parsed))
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Blocked {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Network {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
                status: Some(status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            reason: format!("failed to read body: {}", e),
            status: None,
        })?;

        classify_body(url, body)
    }
}

fn classify_send_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            reason: error.to_string(),
            status: error.status().map(|s| s.as_u16()),
        }
    }
}

/// Distinguishes three kinds of 200 response:
/// - a page with visible markup content (returned as-is),
/// - a content-less body (anti-bot stub, classified as blocked),
/// - a script shell with no visible content (needs client-side rendering).
///
/// "Denied" and "needs script execution" are operationally different
/// problems, so they map to different errors.
fn classify_body(url: &str, body: String) -> FetchResult<String> {
    if body.trim().is_empty() {
        return Err(FetchError::Blocked {
            url: url.to_string(),
            status: 200,
        });
    }

    let document = Html::parse_document(&body);

    if visible_text_len(&document) == 0 {
        if has_script(&document) {
            return Err(FetchError::RenderRequired {
                url: url.to_string(),
            });
        }
        return Err(FetchError::Blocked {
            url: url.to_string(),
            status: 200,
        });
    }

    Ok(body)
}

/// Length of body text excluding script/style/noscript content.
fn visible_text_len(document: &Html) -> usize {
    let Some(body_selector) = Selector::parse("body").ok() else {
        return 0;
    };
    let Some(body) = document.select(&body_selector).next() else {
        return 0;
    };

    let mut len = 0;
    for node in body.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            });
            if !hidden {
                len += text.trim().len();
            }
        }
    }
    len
}

fn has_script(document: &Html) -> bool {
    Selector::parse("script")
        .ok()
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_page_passes_classification() {
        let body = "<html><body><h1>Trending</h1><p>content</p></body></html>".to_string();
        assert!(classify_body("https://example.com", body).is_ok());
    }

    #[test]
    fn test_empty_body_is_blocked() {
        let result = classify_body("https://example.com", "   ".to_string());
        assert!(matches!(
            result.unwrap_err(),
            FetchError::Blocked { status: 200, .. }
        ));
    }

    #[test]
    fn test_script_shell_requires_render() {
        let body = r#"<html><body><div id="app"></div><script>window.__DATA__={}</script></body></html>"#
            .to_string();
        let result = classify_body("https://example.com", body);
        assert!(matches!(
            result.unwrap_err(),
            FetchError::RenderRequired { .. }
        ));
    }

    #[test]
    fn test_contentless_markup_without_script_is_blocked() {
        let body = "<html><body><div></div></body></html>".to_string();
        let result = classify_body("https://example.com", body);
        assert!(matches!(result.unwrap_err(), FetchError::Blocked { .. }));
    }

    #[test]
    fn test_script_text_does_not_count_as_visible() {
        let body = r#"<html><body><script>var lots = "of text in here";</script></body></html>"#
            .to_string();
        let document = Html::parse_document(&body);
        assert_eq!(visible_text_len(&document), 0);
    }

    #[test]
    fn test_build_http_client() {
        let config = CrawlerConfig::default();
        assert!(build_http_client(&config).is_ok());
    }
}
