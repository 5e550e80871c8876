//! Composite engagement scoring

use crate::config::ScoringConfig;
use std::collections::BTreeMap;

/// Weighted sum over an item's engagement metrics. Metrics absent from the
/// item contribute zero; metrics absent from the weight table weigh 1.0,
/// so the default configuration is an unweighted sum.
pub fn composite_score(metrics: &BTreeMap<String, f64>, scoring: &ScoringConfig) -> f64 {
    metrics
        .iter()
        .map(|(name, value)| scoring.weight(name) * value)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_unweighted_sum_by_default() {
        let scoring = ScoringConfig::default();
        let m = metrics(&[("stars", 100.0), ("forks", 20.0)]);
        assert_eq!(composite_score(&m, &scoring), 120.0);
    }

    #[test]
    fn test_configured_weight_applies() {
        let mut scoring = ScoringConfig::default();
        scoring.weights.insert("stars".to_string(), 2.0);
        let m = metrics(&[("stars", 100.0), ("forks", 20.0)]);
        assert_eq!(composite_score(&m, &scoring), 220.0);
    }

    #[test]
    fn test_no_metrics_scores_zero() {
        let scoring = ScoringConfig::default();
        assert_eq!(composite_score(&BTreeMap::new(), &scoring), 0.0);
    }
}
