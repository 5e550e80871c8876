//! Locale-aware engagement-number parsing
//!
//! Sources render popularity counts for humans: `"2,345"` stars, `"1.2k"`
//! views, `"3.4万"` reads. Multiplier suffixes scale the base number and
//! thousands separators are stripped before parsing. Trailing label text
//! (`"阅读"`, `"views"`) is ignored.

/// Parses an engagement count, returning `None` when no leading number is
/// present.
///
/// Recognized multipliers: `k`/`K` and `千` (×1 000), `w`/`W` and `万`
/// (×10 000), `m`/`M` (×1 000 000).
///
/// # Arguments
///
/// * `raw` - The rendered count, possibly with separators, a multiplier
///   suffix, and a trailing label
///
/// # Returns
///
/// * `Some(f64)` - The count scaled by its multiplier
/// * `None` - The text carries no leading number
///
/// # Examples
///
/// ```
/// use trendscout::sources::parse_engagement;
///
/// assert_eq!(parse_engagement("1.2k"), Some(1200.0));
/// assert_eq!(parse_engagement("3.4万阅读"), Some(34_000.0));
/// assert_eq!(parse_engagement("views"), None);
/// ```
pub fn parse_engagement(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut digits = String::new();
    let mut suffix_start = trimmed.len();

    for (idx, ch) in trimmed.char_indices() {
        if ch.is_ascii_digit() || ch == '.' {
            digits.push(ch);
        } else if ch == ',' {
            // thousands separator
            continue;
        } else {
            suffix_start = idx;
            break;
        }
    }

    if digits.is_empty() {
        return None;
    }

    let base: f64 = digits.parse().ok()?;

    let multiplier = trimmed[suffix_start..]
        .chars()
        .next()
        .map(|ch| match ch {
            'k' | 'K' | '千' => 1_000.0,
            'w' | 'W' | '万' => 10_000.0,
            'm' | 'M' => 1_000_000.0,
            _ => 1.0,
        })
        .unwrap_or(1.0);

    Some(base * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_number() {
        assert_eq!(parse_engagement("345"), Some(345.0));
    }

    #[test]
    fn test_thousands_separator_stripped() {
        assert_eq!(parse_engagement("2,345"), Some(2345.0));
        assert_eq!(parse_engagement("1,234,567"), Some(1_234_567.0));
    }

    #[test]
    fn test_k_suffix() {
        assert_eq!(parse_engagement("1.2k"), Some(1200.0));
        assert_eq!(parse_engagement("15K"), Some(15_000.0));
    }

    #[test]
    fn test_cjk_wan_suffix() {
        assert_eq!(parse_engagement("3.4万"), Some(34_000.0));
        assert_eq!(parse_engagement("2w"), Some(20_000.0));
    }

    #[test]
    fn test_cjk_qian_suffix() {
        assert_eq!(parse_engagement("5千"), Some(5_000.0));
    }

    #[test]
    fn test_m_suffix() {
        assert_eq!(parse_engagement("1.5m"), Some(1_500_000.0));
    }

    #[test]
    fn test_trailing_label_ignored() {
        assert_eq!(parse_engagement("1.2万阅读"), Some(12_000.0));
        assert_eq!(parse_engagement("356 views"), Some(356.0));
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(parse_engagement("  1.2k \n"), Some(1200.0));
    }

    #[test]
    fn test_no_number() {
        assert_eq!(parse_engagement(""), None);
        assert_eq!(parse_engagement("views"), None);
        assert_eq!(parse_engagement("—"), None);
    }
}
