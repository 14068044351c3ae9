//! Ranking metrics over score / relevance matrices: NDCG@K, Recall@K,
//! Precision@K, F1@K, 1-call@K and AUC.
//!
//! Every function returns one value per query row, in row order. An item is
//! relevant when its ground-truth value is greater than zero.

use crate::eval::matrix::{top_k_indices, Matrix};
use crate::error::{MetricsError, Result};

/// Checks shapes and resolves the effective cutoff: `k == 0` is an error,
/// `k` beyond the item count is clamped to it.
fn effective_k(scores: &Matrix, ground_truth: &Matrix, k: usize) -> Result<usize> {
    scores.ensure_same_shape(ground_truth)?;
    if k == 0 {
        return Err(MetricsError::InvalidInput("k must be greater than 0".to_string()));
    }
    let n_items = scores.cols();
    if k > n_items {
        log::debug!("k={} exceeds {} items, clamping", k, n_items);
        return Ok(n_items);
    }
    Ok(k)
}

/// Applies `f(truth_row, top_k)` to every query.
fn per_query<F>(scores: &Matrix, ground_truth: &Matrix, k: usize, f: F) -> Result<Vec<f64>>
where
    F: Fn(&[f64], &[usize]) -> f64,
{
    let k = effective_k(scores, ground_truth, k)?;
    Ok(scores
        .iter_rows()
        .zip(ground_truth.iter_rows())
        .map(|(s, t)| f(t, &top_k_indices(s, k)))
        .collect())
}

fn discount(rank: usize) -> f64 {
    // rank is 0-based: position 1 gets log2(2) = 1
    ((rank + 2) as f64).log2()
}

fn hits(truth: &[f64], top: &[usize]) -> usize {
    top.iter().filter(|&&i| truth[i] > 0.0).count()
}

fn relevant_count(truth: &[f64]) -> usize {
    truth.iter().filter(|&&r| r > 0.0).count()
}

fn ndcg_row(truth: &[f64], top: &[usize]) -> f64 {
    let dcg: f64 = top
        .iter()
        .enumerate()
        .filter(|&(_, &i)| truth[i] > 0.0)
        .map(|(rank, &i)| truth[i] / discount(rank))
        .sum();

    let mut ideal: Vec<f64> = truth.iter().copied().filter(|&r| r > 0.0).collect();
    ideal.sort_by(|a, b| b.total_cmp(a));
    let idcg: f64 = ideal
        .iter()
        .take(top.len())
        .enumerate()
        .map(|(rank, &r)| r / discount(rank))
        .sum();

    if idcg == 0.0 {
        return 0.0;
    }
    dcg / idcg
}

fn recall_row(truth: &[f64], top: &[usize]) -> f64 {
    let relevant = relevant_count(truth);
    if relevant == 0 {
        return 0.0;
    }
    hits(truth, top) as f64 / relevant as f64
}

fn precision_row(truth: &[f64], top: &[usize]) -> f64 {
    if top.is_empty() {
        return 0.0;
    }
    hits(truth, top) as f64 / top.len() as f64
}

/// Normalized Discounted Cumulative Gain at K.
///
/// ```text
/// DCG@k  = Σ rel(rank_i) / log2(i + 1)   for i in 1..=k
/// IDCG@k = DCG of the relevance values sorted descending
/// NDCG@k = DCG@k / IDCG@k, or 0 when IDCG@k is 0
/// ```
///
/// Relevance may be binary or graded.
pub fn ndcg_at_k(scores: &Matrix, ground_truth: &Matrix, k: usize) -> Result<Vec<f64>> {
    per_query(scores, ground_truth, k, |t, top| ndcg_row(t, top))
}

/// Recall at K: (relevant items in top-K) / (all relevant items).
/// Returns 0.0 for a query with no relevant items.
pub fn recall_at_k(scores: &Matrix, ground_truth: &Matrix, k: usize) -> Result<Vec<f64>> {
    per_query(scores, ground_truth, k, |t, top| recall_row(t, top))
}

/// Precision at K: (relevant items in top-K) / K, with K after clamping.
pub fn precision_at_k(scores: &Matrix, ground_truth: &Matrix, k: usize) -> Result<Vec<f64>> {
    per_query(scores, ground_truth, k, |t, top| precision_row(t, top))
}

/// Harmonic mean of Precision@K and Recall@K; 0.0 when both are 0.
pub fn f1_at_k(scores: &Matrix, ground_truth: &Matrix, k: usize) -> Result<Vec<f64>> {
    per_query(scores, ground_truth, k, |t, top| {
        let p = precision_row(t, top);
        let r = recall_row(t, top);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    })
}

/// 1-call at K (hit rate): 1.0 if any relevant item is in the top-K, else 0.0.
pub fn one_call_at_k(scores: &Matrix, ground_truth: &Matrix, k: usize) -> Result<Vec<f64>> {
    per_query(scores, ground_truth, k, |t, top| {
        if hits(t, top) > 0 {
            1.0
        } else {
            0.0
        }
    })
}

/// Area under the ROC curve per query.
///
/// Fraction of (relevant, non-relevant) pairs in which the relevant item scores
/// higher; ties count one half. Items scored `-inf` (see [`Matrix::mask_seen`])
/// are left out. 0.0 when either class is empty.
pub fn auc(scores: &Matrix, ground_truth: &Matrix) -> Result<Vec<f64>> {
    scores.ensure_same_shape(ground_truth)?;
    Ok(scores
        .iter_rows()
        .zip(ground_truth.iter_rows())
        .map(|(s, t)| auc_row(s, t))
        .collect())
}

fn auc_row(scores: &[f64], truth: &[f64]) -> f64 {
    let mut pos = Vec::new();
    let mut neg = Vec::new();
    for (&s, &r) in scores.iter().zip(truth) {
        if s == f64::NEG_INFINITY || s.is_nan() {
            continue;
        }
        if r > 0.0 {
            pos.push(s);
        } else {
            neg.push(s);
        }
    }
    if pos.is_empty() || neg.is_empty() {
        return 0.0;
    }
    let mut wins = 0.0;
    for &p in &pos {
        for &n in &neg {
            if p > n {
                wins += 1.0;
            } else if p == n {
                wins += 0.5;
            }
        }
    }
    wins / (pos.len() * neg.len()) as f64
}

/// Mean over queries with NaN treated as 0.0. Returns 0.0 for no queries.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|v| if v.is_nan() { 0.0 } else { *v }).sum();
    sum / values.len() as f64
}
