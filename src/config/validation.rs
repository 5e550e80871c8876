use crate::config::types::{CacheConfig, Config, CrawlerConfig, SourcesConfig, StealthConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_cache_config(&config.cache)?;
    validate_stealth_config(&config.stealth)?;
    validate_sources_config(&config.sources)?;
    validate_domains(config)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_items < 1 || config.max_items > 200 {
        return Err(ConfigError::Validation(format!(
            "max_items must be between 1 and 200, got {}",
            config.max_items
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.retry_times > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_times must be <= 10, got {}",
            config.retry_times
        )));
    }

    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay_min_ms ({}) must not exceed delay_max_ms ({})",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    if config.global_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "global_timeout_secs must be >= 1, got {}",
            config.global_timeout_secs
        )));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.enabled && config.ttl_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "cache ttl_secs must be >= 1 when the cache is enabled, got {}",
            config.ttl_secs
        )));
    }
    Ok(())
}

/// Validates the anti-detection configuration
fn validate_stealth_config(config: &StealthConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user_agents pool cannot be empty".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents pool contains a blank entry".to_string(),
        ));
    }

    Ok(())
}

/// Validates source flags and base-URL overrides
fn validate_sources_config(config: &SourcesConfig) -> Result<(), ConfigError> {
    if config.enabled().is_empty() {
        return Err(ConfigError::Validation(
            "at least one source must be enabled".to_string(),
        ));
    }

    for (source, base) in &config.base_urls {
        let url = Url::parse(base).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base-url for '{}': {}", source, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url for '{}' must be http(s), got '{}'",
                source,
                url.scheme()
            )));
        }
    }

    Ok(())
}

/// Validates the domain-keyword table
fn validate_domains(config: &Config) -> Result<(), ConfigError> {
    if config.domains.is_empty() {
        return Err(ConfigError::Validation(
            "domains table cannot be empty".to_string(),
        ));
    }

    for (tag, keywords) in &config.domains {
        if tag.trim().is_empty() {
            return Err(ConfigError::Validation(
                "domain tag cannot be blank".to_string(),
            ));
        }

        if keywords.is_empty() {
            return Err(ConfigError::Validation(format!(
                "domain '{}' must map to at least one keyword",
                tag
            )));
        }

        if keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "domain '{}' contains a blank keyword",
                tag
            )));
        }
    }

    Ok(())
}
