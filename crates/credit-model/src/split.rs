//! Deterministic train/evaluation partition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices for the two halves of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_fraction)` rows.
///
/// At least one row always stays in the training half, so a single-row table
/// trains on that row and has an empty evaluation half.
pub fn train_eval_split(n: usize, test_fraction: f64, seed: u64) -> Split {
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let wanted = (n as f64 * test_fraction).ceil() as usize;
    let eval_len = wanted.min(n.saturating_sub(1));
    let train = order.split_off(eval_len);

    Split { train, eval: order }
}
