//! Anti-detection request fingerprints
//!
//! Every outbound request carries a header set that looks like a real
//! browser navigation: a user agent drawn from a rotating pool plus the
//! language, fetch-metadata, and referer headers that agent would send.
//! Delays between requests are sampled uniformly from configured bounds.
//!
//! The helper is seedable so tests can pin the rotation order.

use crate::config::StealthConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Built-in pool of current desktop browser signatures, used when the
/// configuration does not supply its own.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.2420.81",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

/// Generates realistic request fingerprints and randomized delays.
pub struct Stealth {
    user_agents: Vec<String>,
    delay_min: Duration,
    delay_max: Duration,
    rng: Mutex<StdRng>,
}

impl Stealth {
    /// Creates a helper backed by the process random source.
    pub fn new(config: &StealthConfig, delay_min_ms: u64, delay_max_ms: u64) -> Self {
        Self::with_rng(config, delay_min_ms, delay_max_ms, StdRng::from_os_rng())
    }

    /// Creates a deterministic helper for tests.
    pub fn seeded(config: &StealthConfig, delay_min_ms: u64, delay_max_ms: u64, seed: u64) -> Self {
        Self::with_rng(
            config,
            delay_min_ms,
            delay_max_ms,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(config: &StealthConfig, delay_min_ms: u64, delay_max_ms: u64, rng: StdRng) -> Self {
        Self {
            user_agents: config.user_agents.clone(),
            delay_min: Duration::from_millis(delay_min_ms),
            delay_max: Duration::from_millis(delay_max_ms),
            rng: Mutex::new(rng),
        }
    }

    /// Picks one user-agent string from the pool.
    pub fn user_agent(&self) -> &str {
        let idx = {
            let mut rng = self.rng.lock().unwrap();
            rng.random_range(0..self.user_agents.len())
        };
        &self.user_agents[idx]
    }

    /// Builds a consistent browser-like header set for a navigation to
    /// `target`. The referer is a synthetic same-site root so the request
    /// looks like an in-site click rather than a cold hit.
    pub fn headers(&self, target: &Url) -> HeaderMap {
        let mut headers = HeaderMap::new();

        insert(&mut headers, "user-agent", self.user_agent());
        insert(
            &mut headers,
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        );
        insert(
            &mut headers,
            "accept-language",
            "en-US,en;q=0.9,zh-CN;q=0.8,zh;q=0.7",
        );
        insert(&mut headers, "dnt", "1");
        insert(&mut headers, "upgrade-insecure-requests", "1");
        insert(&mut headers, "sec-fetch-dest", "document");
        insert(&mut headers, "sec-fetch-mode", "navigate");
        insert(&mut headers, "sec-fetch-site", "same-origin");
        insert(&mut headers, "sec-fetch-user", "?1");
        insert(&mut headers, "cache-control", "max-age=0");

        if let Some(host) = target.host_str() {
            let referer = format!("{}://{}/", target.scheme(), host);
            insert(&mut headers, "referer", &referer);
        }

        headers
    }

    /// Samples a pre-request delay uniformly from the configured bounds.
    pub fn delay(&self) -> Duration {
        if self.delay_max <= self.delay_min {
            return self.delay_min;
        }
        let mut rng = self.rng.lock().unwrap();
        let ms = rng.random_range(self.delay_min.as_millis() as u64..=self.delay_max.as_millis() as u64);
        Duration::from_millis(ms)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    // Values are built from static strings and parsed URLs; the only way
    // this can fail is a non-ASCII user agent in the config pool, which is
    // dropped rather than sent mangled.
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), value);
    }
}
