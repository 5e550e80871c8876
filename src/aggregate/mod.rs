//! Trend aggregation: deduplicate, score, rank, classify
//!
//! This stage is a pure function over the merged item list. It holds no
//! state and performs no I/O, so identical input always yields identical
//! output. It is the deterministic anchor under a very non-deterministic
//! crawl pipeline.

mod score;

pub use score::composite_score;

use crate::config::ScoringConfig;
use crate::model::{RawItem, SourceKind, TrendEntry, TrendSummary};
use crate::url::normalize_url;
use std::collections::{BTreeMap, HashMap};

/// Minimum length for a title token to count toward keyword trends; drops
/// articles, prepositions, and version fragments.
const MIN_TOKEN_LEN: usize = 3;

/// Aggregates raw items into the final trend summary.
///
/// Deduplicates by canonical URL, scores and ranks every survivor, splits
/// the ranking into projects and articles by source kind, and derives
/// keyword and topic frequency tables.
///
/// # Arguments
///
/// * `items` - Merged items from every successful source
/// * `scoring` - Per-metric weights for the composite score
///
/// # Returns
///
/// A [`TrendSummary`] with entries ranked by descending score
pub fn aggregate(items: Vec<RawItem>, scoring: &ScoringConfig) -> TrendSummary {
    let deduped = dedup_by_url(items, scoring);

    let mut scored: Vec<(RawItem, f64)> = deduped
        .into_iter()
        .map(|item| {
            let score = composite_score(&item.metrics, scoring);
            (item, score)
        })
        .collect();

    // Stable: equal scores keep their original arrival order, which makes
    // the ranking reproducible for identical input.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let keyword_trends = keyword_trends(scored.iter().map(|(item, _)| item));
    let topic_trends = topic_trends(scored.iter().map(|(item, _)| item));

    let mut projects = Vec::new();
    let mut articles = Vec::new();
    for (item, score) in scored {
        let entry = TrendEntry {
            title: item.title,
            url: item.url,
            snippet: item.snippet,
            source: item.source,
            domain: item.domain,
            tags: item.tags,
            metrics: item.metrics,
            score,
        };
        match entry.source.kind() {
            SourceKind::Project => projects.push(entry),
            SourceKind::Content => articles.push(entry),
        }
    }

    TrendSummary {
        projects,
        articles,
        keyword_trends,
        topic_trends,
    }
}

/// Collapses items sharing a normalized URL, keeping the higher-scoring
/// item in the position where the URL first arrived.
fn dedup_by_url(items: Vec<RawItem>, scoring: &ScoringConfig) -> Vec<RawItem> {
    let mut kept: Vec<RawItem> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for item in items {
        // Unnormalizable URLs still get an identity: themselves
        let key = normalize_url(&item.url).unwrap_or_else(|_| item.url.clone());

        match index_by_key.get(&key) {
            Some(&idx) => {
                let existing = composite_score(&kept[idx].metrics, scoring);
                let candidate = composite_score(&item.metrics, scoring);
                if candidate > existing {
                    kept[idx] = item;
                }
            }
            None => {
                index_by_key.insert(key, kept.len());
                kept.push(item);
            }
        }
    }

    kept
}

/// Frequency of case-normalized tags and title tokens, descending, with a
/// term-ascending tie-break for reproducible output.
fn keyword_trends<'a>(items: impl Iterator<Item = &'a RawItem>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for item in items {
        for tag in &item.tags {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
        for token in tokenize(&item.title) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut trends: Vec<(String, usize)> = counts.into_iter().collect();
    trends.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    trends
}

/// Item counts grouped by domain tag, descending, tag-ascending tie-break.
fn topic_trends<'a>(items: impl Iterator<Item = &'a RawItem>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for item in items {
        if !item.domain.is_empty() {
            *counts.entry(item.domain.clone()).or_insert(0) += 1;
        }
    }

    let mut trends: Vec<(String, usize)> = counts.into_iter().collect();
    trends.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    trends
}

/// Splits a title into lowercase alphanumeric tokens, dropping short ones.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(|t| t.to_lowercase())
        .collect()
}
