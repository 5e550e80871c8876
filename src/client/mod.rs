//! Rate-limited fetch client, anti-detection helper, retry policy, and the
//! shared crawl-result cache.

mod cache;
mod fetch;
mod retry;
mod stealth;

pub use cache::CrawlCache;
pub use fetch::{build_http_client, FetchClient};
pub use retry::{BackoffSchedule, RetryPolicy};
pub use stealth::{Stealth, DEFAULT_USER_AGENTS};
