//! String-driven batch evaluation: parse `"<name>@<k>"` specs and run the
//! matching metrics into a [`MetricResult`].

use crate::config::MetricsConfig;
use crate::error::Result;
use crate::eval::matrix::Matrix;
use crate::eval::metrics::{mean, ndcg_at_k, recall_at_k};
use serde::Serialize;
use std::collections::BTreeMap;

type MetricFn = fn(&Matrix, &Matrix, usize) -> Result<Vec<f64>>;

/// Metric families reachable through [`compute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Recall,
    Ndcg,
}

impl MetricKind {
    /// Resolve a metric name; accepts both `recall` and `recall_at_k` forms.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "recall" | "recall_at_k" => Some(Self::Recall),
            "ndcg" | "ndcg_at_k" => Some(Self::Ndcg),
            _ => None,
        }
    }

    /// Canonical name used in result keys.
    pub fn name(self) -> &'static str {
        match self {
            Self::Recall => "recall",
            Self::Ndcg => "ndcg",
        }
    }

    fn function(self) -> MetricFn {
        match self {
            Self::Recall => recall_at_k,
            Self::Ndcg => ndcg_at_k,
        }
    }

    fn default_ks(self, config: &MetricsConfig) -> &[usize] {
        match self {
            Self::Recall => &config.recall_ks,
            Self::Ndcg => &config.ndcg_ks,
        }
    }
}

/// A parsed metric request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSpec {
    /// `"<name>@<k>"`
    AtK(MetricKind, usize),
    /// Bare `"<name>"`: every default k for that family.
    Defaults(MetricKind),
}

impl MetricSpec {
    /// Returns None for unknown names, a non-numeric k, or `k == 0`.
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.split_once('@') {
            Some((name, k)) => {
                let kind = MetricKind::from_name(name.trim())?;
                let k: usize = k.trim().parse().ok()?;
                if k == 0 {
                    return None;
                }
                Some(Self::AtK(kind, k))
            }
            None => MetricKind::from_name(spec.trim()).map(Self::Defaults),
        }
    }
}

/// Metric key (`"ndcg@3"`) to one value per query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricResult {
    values: BTreeMap<String, Vec<f64>>,
}

impl MetricResult {
    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Aggregate scalar per key: mean over queries, NaN counted as 0.
    pub fn means(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), mean(v)))
            .collect()
    }

    /// Pretty JSON report of the per-query values.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn insert(&mut self, key: String, values: Vec<f64>) {
        self.values.insert(key, values);
    }
}

/// Runs metric specs against configured default k-sets.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: MetricsConfig,
}

impl Evaluator {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Evaluate every recognised spec. Unknown or malformed specs are skipped
    /// without error; shape mismatches are always reported.
    pub fn compute<S: AsRef<str>>(
        &self,
        scores: &Matrix,
        ground_truth: &Matrix,
        metric_specs: &[S],
    ) -> Result<MetricResult> {
        scores.ensure_same_shape(ground_truth)?;
        let mut result = MetricResult::default();

        for spec in metric_specs {
            let spec = spec.as_ref();
            // explicit specs keep the caller's spelling as key
            let jobs: Vec<(String, MetricKind, usize)> = match MetricSpec::parse(spec) {
                Some(MetricSpec::AtK(kind, k)) => vec![(spec.to_string(), kind, k)],
                Some(MetricSpec::Defaults(kind)) => kind
                    .default_ks(&self.config)
                    .iter()
                    .map(|&k| (format!("{}@{}", kind.name(), k), kind, k))
                    .collect(),
                None => {
                    log::debug!("Ignoring unsupported metric spec '{}'", spec);
                    continue;
                }
            };

            for (key, kind, k) in jobs {
                if result.contains_key(&key) {
                    continue;
                }
                let values = (kind.function())(scores, ground_truth, k)?;
                result.insert(key, values);
            }
        }

        Ok(result)
    }
}

/// [`Evaluator::compute`] with the default k-sets.
pub fn compute<S: AsRef<str>>(
    scores: &Matrix,
    ground_truth: &Matrix,
    metric_specs: &[S],
) -> Result<MetricResult> {
    Evaluator::default().compute(scores, ground_truth, metric_specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetricsError;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn fixture() -> (Matrix, Matrix) {
        let scores = Matrix::from_rows(vec![
            vec![3.0, 2.0, 1.0, 0.0],
            vec![0.0, 1.0, 2.0, 3.0],
        ])
        .unwrap();
        let gt = Matrix::from_rows(vec![
            vec![1.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
        ])
        .unwrap();
        (scores, gt)
    }

    #[test]
    fn parse_specs() {
        assert_eq!(
            MetricSpec::parse("recall@2"),
            Some(MetricSpec::AtK(MetricKind::Recall, 2))
        );
        assert_eq!(
            MetricSpec::parse("ndcg_at_k"),
            Some(MetricSpec::Defaults(MetricKind::Ndcg))
        );
        assert_eq!(MetricSpec::parse("precision@10"), None);
        assert_eq!(MetricSpec::parse("ndcg@"), None);
        assert_eq!(MetricSpec::parse("ndcg@x"), None);
        assert_eq!(MetricSpec::parse("ndcg@0"), None);
    }

    #[test]
    fn explicit_specs_produce_exact_keys() {
        init_logger();
        let (scores, gt) = fixture();
        let result = compute(&scores, &gt, &["recall@2", "recall@3", "ndcg@2"]).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.contains_key("recall@2"));
        assert!(result.contains_key("recall@3"));
        assert!(result.contains_key("ndcg@2"));
        assert!(!result.contains_key("ndcg@3"));

        let recall3 = result.get("recall@3").unwrap();
        assert!((recall3[0] - 2.0 / 3.0).abs() < 1e-5);
        assert!((recall3[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn explicit_specs_keyed_by_caller_spelling() {
        let (scores, gt) = fixture();
        let specs = ["ndcg@03", "recall_at_k@2", "ndcg @2"];
        let result = compute(&scores, &gt, &specs).unwrap();
        assert_eq!(result.len(), specs.len());
        for spec in specs {
            assert!(result.contains_key(spec), "missing key {}", spec);
        }
        assert!(!result.contains_key("ndcg@3"));
        assert_eq!(
            result.get("ndcg@03").unwrap(),
            ndcg_at_k(&scores, &gt, 3).unwrap().as_slice()
        );
        assert_eq!(
            result.get("recall_at_k@2").unwrap(),
            recall_at_k(&scores, &gt, 2).unwrap().as_slice()
        );
    }

    #[test]
    fn empty_query_set_gives_empty_vectors() {
        let empty = Matrix::from_rows(vec![]).unwrap();
        let result = compute(&empty, &empty, &["ndcg@2", "recall"]).unwrap();
        assert!(result.contains_key("ndcg@2"));
        assert!(result.contains_key("recall@5"));
        assert!(result.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn bare_names_expand_to_defaults() {
        init_logger();
        let (scores, gt) = fixture();
        let result = compute(&scores, &gt, &["recall_at_k", "ndcg_at_k"]).unwrap();
        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(
            keys,
            vec!["ndcg@10", "ndcg@20", "ndcg@5", "recall@10", "recall@20", "recall@5"]
        );
        // k beyond 4 items clamps, so every row has all its relevant items
        assert_eq!(result.get("recall@20").unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn bare_names_follow_config() {
        let (scores, gt) = fixture();
        let evaluator = Evaluator::new(MetricsConfig {
            recall_ks: vec![1, 2],
            ndcg_ks: vec![3],
        });
        let result = evaluator.compute(&scores, &gt, &["recall", "ndcg"]).unwrap();
        let keys: Vec<&str> = result.keys().collect();
        assert_eq!(keys, vec!["ndcg@3", "recall@1", "recall@2"]);
    }

    #[test]
    fn unsupported_metric_is_ignored() {
        init_logger();
        let (scores, gt) = fixture();
        let result = compute(&scores, &gt, &["precision@10"]).unwrap();
        assert!(result.is_empty());

        let result = compute(&scores, &gt, &["precision@10", "ndcg@2"]).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["ndcg@2"]);
    }

    #[test]
    fn empty_specs_give_empty_result() {
        let (scores, gt) = fixture();
        let specs: [&str; 0] = [];
        assert!(compute(&scores, &gt, &specs).unwrap().is_empty());
    }

    #[test]
    fn owned_string_specs_accepted() {
        let (scores, gt) = fixture();
        let specs = vec!["ndcg@1".to_string()];
        let result = compute(&scores, &gt, &specs).unwrap();
        assert_eq!(result.get("ndcg@1").unwrap(), &[1.0, 1.0]);
    }

    #[test]
    fn shape_mismatch_is_error() {
        let (scores, _) = fixture();
        let gt = Matrix::from_rows(vec![vec![1.0, 0.0, 0.0, 0.0]]).unwrap();
        let err = compute(&scores, &gt, &["precision@10"]).unwrap_err();
        assert!(matches!(err, MetricsError::DimensionMismatch { .. }));
    }

    #[test]
    fn matches_direct_calls() {
        let (scores, gt) = fixture();
        let result = compute(&scores, &gt, &["ndcg@3", "recall@2"]).unwrap();
        assert_eq!(result.get("ndcg@3").unwrap(), ndcg_at_k(&scores, &gt, 3).unwrap().as_slice());
        assert_eq!(result.get("recall@2").unwrap(), recall_at_k(&scores, &gt, 2).unwrap().as_slice());
    }

    #[test]
    fn means_and_json_report() {
        let (scores, gt) = fixture();
        let result = compute(&scores, &gt, &["recall@3"]).unwrap();
        let means = result.means();
        assert!((means["recall@3"] - (2.0 / 3.0 + 1.0) / 2.0).abs() < 1e-5);

        let json = result.to_json().unwrap();
        let parsed: BTreeMap<String, Vec<f64>> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["recall@3"].len(), 2);
    }
}
