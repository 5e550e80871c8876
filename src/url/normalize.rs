use crate::UrlError;
use url::Url;

/// Query parameters that carry tracking or navigation noise rather than
/// identity. Two URLs differing only in these refer to the same entity.
const NOISE_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "ref_src",
    "source",
    "from",
    "spm",
    "share_token",
];

/// Canonicalizes a URL into the identity key used for deduplication.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject non-HTTP(S) or malformed input
/// 2. Fold the scheme to https (scheme is noise for identity)
/// 3. Lowercase the host and remove a `www.` prefix
/// 4. Normalize the path:
///    - Remove dot segments (. and ..)
///    - Collapse duplicate slashes
///    - Remove the trailing slash (except for the root /)
/// 5. Remove the fragment (everything after #)
/// 6. Remove tracking and noise query parameters
/// 7. Sort the remaining query parameters alphabetically
///
/// # Arguments
///
/// * `url_str` - The URL string to canonicalize
///
/// # Returns
///
/// * `Ok(String)` - The canonical identity key
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use trendscout::url::normalize_url;
///
/// let key = normalize_url("http://WWW.GITHUB.COM/redis/redis/?utm_source=feed").unwrap();
/// assert_eq!(key, "https://github.com/redis/redis");
/// ```
pub fn normalize_url(url_str: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "https" => {}
        "http" => {
            // Infallible for http URLs; they always have a host
            let _ = url.set_scheme("https");
        }
        other => {
            return Err(UrlError::InvalidScheme(format!(
                "only HTTP and HTTPS are supported, got: {}",
                other
            )))
        }
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    let mut host = host.to_lowercase();
    if let Some(stripped) = host.strip_prefix("www.") {
        host = stripped.to_string();
    }
    url.set_host(Some(host.as_str()))
        .map_err(|e| UrlError::Malformed(format!("failed to set host: {}", e)))?;

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_noise_param(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(query.as_str()));
        }
    }

    Ok(url.to_string())
}

/// Removes dot segments and collapses the path.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

fn is_noise_param(key: &str) -> bool {
    NOISE_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_folded_to_https() {
        assert_eq!(
            normalize_url("http://example.com/page").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_same_entity_across_schemes() {
        let a = normalize_url("http://Example.com/repo").unwrap();
        let b = normalize_url("https://example.com/repo/").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_www_prefix_dropped() {
        assert_eq!(
            normalize_url("https://www.example.com/").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_trailing_slash_dropped() {
        assert_eq!(
            normalize_url("https://example.com/page/").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_root_slash_kept() {
        assert_eq!(
            normalize_url("https://example.com/").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_fragment_dropped() {
        assert_eq!(
            normalize_url("https://example.com/page#answer-42").unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_tracking_params_dropped() {
        assert_eq!(
            normalize_url("https://example.com/a?utm_source=x&spm=1001.2014&keep=1").unwrap(),
            "https://example.com/a?keep=1"
        );
    }

    #[test]
    fn test_query_params_sorted() {
        assert_eq!(
            normalize_url("https://example.com/a?b=2&a=1").unwrap(),
            "https://example.com/a?a=1&b=2"
        );
    }

    #[test]
    fn test_all_noise_query_removed() {
        assert_eq!(
            normalize_url("https://example.com/a?from=search&ref=home").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_dot_segments_removed() {
        assert_eq!(
            normalize_url("https://example.com/a/../b/./c").unwrap(),
            "https://example.com/b/c"
        );
    }

    #[test]
    fn test_duplicate_slashes_collapsed() {
        assert_eq!(
            normalize_url("https://example.com///x//y").unwrap(),
            "https://example.com/x/y"
        );
    }

    #[test]
    fn test_case_only_host() {
        assert_eq!(
            normalize_url("https://GitHub.COM/Rust-Lang/rust").unwrap(),
            "https://github.com/Rust-Lang/rust"
        );
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        assert!(matches!(
            normalize_url("ftp://example.com/x").unwrap_err(),
            UrlError::InvalidScheme(_)
        ));
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(normalize_url("not a url").is_err());
    }
}
