//! Model hyperparameters.
//!
//! [`ModelConfig`] is passed to [`crate::ScoringModel::new`] and stored in the
//! persisted artifact alongside the fitted parameters.

use credit_core::error::ModelError;
use serde::{Deserialize, Serialize};

/// Default number of trees in the ensemble.
pub const DEFAULT_TREES: usize = 100;
/// Default maximum tree depth (root is depth 0).
pub const DEFAULT_MAX_DEPTH: usize = 10;
/// Default share of rows held out for evaluation.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;
/// Default seed for the split and the ensemble.
pub const DEFAULT_SEED: u64 = 42;

/// Hyperparameters for training a [`crate::ScoringModel`].
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Minimum samples a node needs before it may be split.
    pub min_samples_split: usize,
    /// Minimum samples each child of a split must keep.
    pub min_samples_leaf: usize,
    /// Draw each tree's training rows with replacement.
    pub bootstrap: bool,
    /// Share of rows held out for evaluation, in `[0, 1)`.
    pub test_fraction: f64,
    /// Seed for the train/evaluation shuffle and the ensemble.
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_TREES,
            max_depth: DEFAULT_MAX_DEPTH,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
        }
    }
}

impl ModelConfig {
    /// Reject configurations that cannot produce a usable forest.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidConfig("n_estimators must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidConfig("max_depth must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidConfig(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(ModelError::InvalidConfig(format!(
                "test_fraction must be in [0, 1): {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}
