//! CART regression tree with squared-error splits.
//!
//! Nodes live in a flat vector with the root at index 0. Children are always
//! pushed after their parent, so child indices are strictly greater than the
//! parent's.

/// Tree growth limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub enum Node {
    Leaf {
        value: f64,
    },
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// Best split found for one node.
struct Candidate {
    feature: usize,
    threshold: f64,
    /// Rows going left once sorted by `feature`.
    left_len: usize,
    /// `sum_l^2 / n_l + sum_r^2 / n_r`; larger is a lower squared error.
    proxy: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` named by `samples` (duplicates allowed).
    ///
    /// `samples` must be non-empty and every index must be in range.
    pub fn fit(x: &[Vec<f64>], y: &[f64], samples: &[usize], params: TreeParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut idx = samples.to_vec();
        tree.grow(x, y, &mut idx, 0, params);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        idx: &mut [usize],
        depth: usize,
        params: TreeParams,
    ) -> usize {
        let n = idx.len();
        let sum: f64 = idx.iter().map(|&i| y[i]).sum();
        let mean = sum / n as f64;
        let sse: f64 = idx.iter().map(|&i| (y[i] - mean).powi(2)).sum();

        let at = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= params.max_depth
            || n < params.min_samples_split
            || n < 2 * params.min_samples_leaf
            || sse <= f64::EPSILON
        {
            return at;
        }

        let Some(best) = best_split(x, y, idx, params.min_samples_leaf) else {
            return at;
        };

        idx.sort_by(|&a, &b| x[a][best.feature].total_cmp(&x[b][best.feature]));
        let (left_idx, right_idx) = idx.split_at_mut(best.left_len);
        let left = self.grow(x, y, left_idx, depth + 1, params);
        let right = self.grow(x, y, right_idx, depth + 1, params);

        self.nodes[at] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        at
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    /// Structural check used when loading a persisted tree: every split reads
    /// a feature below `width` and points forward to existing nodes.
    pub(crate) fn validate(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(format!("node {i}: non-finite leaf value"));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= width {
                        return Err(format!("node {i}: feature {feature} >= {width}"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i}: bad child index {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn best_split(x: &[Vec<f64>], y: &[f64], idx: &[usize], min_leaf: usize) -> Option<Candidate> {
    let n = idx.len();
    let width = x[idx[0]].len();
    let total: f64 = idx.iter().map(|&i| y[i]).sum();
    let mut order = idx.to_vec();
    let mut best: Option<Candidate> = None;

    for feature in 0..width {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += y[order[k]];
            let left_len = k + 1;
            let right_len = n - left_len;
            if left_len < min_leaf || right_len < min_leaf {
                continue;
            }
            let lo = x[order[k]][feature];
            let hi = x[order[k + 1]][feature];
            if lo >= hi {
                continue;
            }
            let right_sum = total - left_sum;
            let proxy = left_sum * left_sum / left_len as f64 + right_sum * right_sum / right_len as f64;
            if best.as_ref().is_none_or(|b| proxy > b.proxy) {
                let mut threshold = lo / 2.0 + hi / 2.0;
                if threshold >= hi || !threshold.is_finite() {
                    threshold = lo;
                }
                best = Some(Candidate {
                    feature,
                    threshold,
                    left_len,
                    proxy,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: TreeParams = TreeParams {
        max_depth: 10,
        min_samples_split: 2,
        min_samples_leaf: 1,
    };

    fn all(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn constant_target_is_single_leaf() {
        let x = vec![vec![1.0], vec![2.0], vec![3.0]];
        let y = vec![5.0, 5.0, 5.0];
        let t = RegressionTree::fit(&x, &y, &all(3), PARAMS);
        assert_eq!(t.node_count(), 1);
        assert_eq!(t.predict_row(&[100.0]), 5.0);
    }

    #[test]
    fn step_function_is_learned_exactly() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { 100.0 } else { 900.0 }).collect();
        let t = RegressionTree::fit(&x, &y, &all(10), PARAMS);
        assert_eq!(t.node_count(), 3);
        assert_eq!(t.predict_row(&[2.0]), 100.0);
        // Threshold sits midway between 4 and 5; ties go left.
        assert_eq!(t.predict_row(&[4.5]), 100.0);
        assert_eq!(t.predict_row(&[4.6]), 900.0);
        assert_eq!(t.predict_row(&[7.0]), 900.0);
    }

    #[test]
    fn picks_informative_feature() {
        // Feature 0 is noise, feature 1 determines the target.
        let x = vec![
            vec![3.0, 0.0],
            vec![1.0, 0.0],
            vec![2.0, 1.0],
            vec![0.0, 1.0],
        ];
        let y = vec![10.0, 10.0, 20.0, 20.0];
        let t = RegressionTree::fit(&x, &y, &all(4), PARAMS);
        match &t.nodes[0] {
            Node::Split { feature, threshold, .. } => {
                assert_eq!(*feature, 1);
                assert_eq!(*threshold, 0.5);
            }
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn depth_limit_respected() {
        let x: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..64).map(|i| (i * 7 % 13) as f64).collect();
        let params = TreeParams { max_depth: 3, ..PARAMS };
        let t = RegressionTree::fit(&x, &y, &all(64), params);
        assert!(t.depth() <= 3);
        assert!(t.node_count() <= 15);
    }

    #[test]
    fn min_samples_leaf_respected() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let y = vec![0.0, 0.0, 0.0, 0.0, 0.0, 100.0];
        let params = TreeParams { min_samples_leaf: 2, ..PARAMS };
        let t = RegressionTree::fit(&x, &y, &all(6), params);
        // The lone outlier cannot be isolated; it shares a leaf with a neighbour.
        assert_eq!(t.predict_row(&[5.0]), 50.0);
    }

    #[test]
    fn duplicate_feature_values_never_split_apart() {
        let x = vec![vec![1.0], vec![1.0], vec![1.0]];
        let y = vec![0.0, 10.0, 20.0];
        let t = RegressionTree::fit(&x, &y, &all(3), PARAMS);
        assert_eq!(t.node_count(), 1);
        assert_eq!(t.predict_row(&[1.0]), 10.0);
    }

    #[test]
    fn bootstrap_duplicates_weight_the_leaf() {
        let x = vec![vec![0.0], vec![0.0]];
        let y = vec![0.0, 30.0];
        // Row 1 drawn twice: the shared leaf averages 0, 30, 30.
        let t = RegressionTree::fit(&x, &y, &[0, 1, 1], PARAMS);
        assert_eq!(t.predict_row(&[0.0]), 20.0);
    }

    #[test]
    fn predictions_stay_within_target_range() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (40 - i) as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| ((i * 37) % 1000) as f64).collect();
        let t = RegressionTree::fit(&x, &y, &all(40), PARAMS);
        for probe in [-1e9, 0.0, 17.5, 1e9] {
            let p = t.predict_row(&[probe, probe]);
            assert!((0.0..=1000.0).contains(&p));
        }
    }

    #[test]
    fn validate_catches_bad_structure() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let t = RegressionTree::fit(&x, &y, &all(10), PARAMS);
        assert!(t.validate(1).is_ok());
        assert!(t.validate(0).is_err());

        let looped = RegressionTree {
            nodes: vec![Node::Split { feature: 0, threshold: 0.0, left: 0, right: 0 }],
        };
        assert!(looped.validate(1).is_err());
        assert!(RegressionTree { nodes: vec![] }.validate(1).is_err());
    }
}
