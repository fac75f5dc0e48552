//! Bootstrap-aggregated regression trees.
//!
//! Each tree draws its own seed from a master RNG seeded with
//! [`ModelConfig::seed`], so the ensemble is reproducible and independent of
//! how trees might later be scheduled.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::ModelConfig;
use crate::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit `config.n_estimators` trees on `x`/`y`.
    ///
    /// `x` must be non-empty and `y.len() == x.len()`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &ModelConfig) -> Self {
        let n = x.len();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };
        let all_rows: Vec<usize> = (0..n).collect();
        let mut master = StdRng::seed_from_u64(config.seed);

        let trees = (0..config.n_estimators)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(master.r#gen::<u64>());
                let tree = if config.bootstrap {
                    let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                    RegressionTree::fit(x, y, &sample, params)
                } else {
                    RegressionTree::fit(x, y, &all_rows, params)
                };
                debug!(tree = i, nodes = tree.node_count(), depth = tree.depth(), "fitted tree");
                tree
            })
            .collect();

        Self { trees }
    }

    /// Mean of the per-tree predictions.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub(crate) fn validate(&self, width: usize) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".into());
        }
        for (i, t) in self.trees.iter().enumerate() {
            t.validate(width).map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}
