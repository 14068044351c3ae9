pub mod config;
pub mod error;
pub mod eval;

pub use config::{Config, MetricsConfig};
pub use error::{MetricsError, Result};
pub use eval::{compute, ndcg_at_k, recall_at_k, Evaluator, Matrix, MetricResult};
