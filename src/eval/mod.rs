//! Evaluation framework: score/relevance matrices, ranking metrics (NDCG@K,
//! Recall@K, Precision@K, F1@K, 1-call@K, AUC) and spec-driven `compute`.

pub mod compute;
pub mod matrix;
pub mod metrics;

pub use compute::{compute, Evaluator, MetricKind, MetricResult, MetricSpec};
pub use matrix::{top_k_indices, Matrix};
pub use metrics::{auc, f1_at_k, mean, ndcg_at_k, one_call_at_k, precision_at_k, recall_at_k};
