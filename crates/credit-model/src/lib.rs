//! # credit-model — Scoring model for Credit Ledger.
//!
//! Generalises the rule-based heuristic labels into a continuous score:
//! - **Split**: seeded 80/20 train/evaluation partition.
//! - **Scaling**: per-column standardisation fitted on the training split only.
//! - **Forest**: bootstrap-aggregated CART regression trees.
//! - **Artifact**: the fitted (forest, scaler, columns) triple persisted as one
//!   checksummed file, written atomically.
//!
//! Training and prediction are single-threaded and fully deterministic for a
//! given [`ModelConfig::seed`].

pub mod artifact;
pub mod config;
pub mod forest;
pub mod metrics;
pub mod model;
pub mod scaler;
pub mod split;
pub mod tree;

pub use config::ModelConfig;
pub use model::{ScoringModel, TrainingReport};
