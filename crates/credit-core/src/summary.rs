//! Dataset and score-distribution summaries for reporting.
//!
//! Pure computation over slices; nothing here affects scoring.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::ScoreCategory;
use crate::types::{ScoreRecord, Transaction, TransactionType, WalletFeatures};

/// Width of one score-distribution bin.
pub const BIN_WIDTH: u16 = 100;

/// Number of score-distribution bins covering `0..=1000`.
pub const BIN_COUNT: usize = 10;

/// Wallets at or above this score count as high scorers.
pub const HIGH_SCORER_FLOOR: u16 = 700;

/// Wallets strictly below this score count as low scorers.
pub const LOW_SCORER_CEILING: u16 = 300;

/// Shape of a transaction set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub total_transactions: usize,
    pub unique_wallets: usize,
    /// Counts per [`TransactionType`], in `TransactionType::ALL` order.
    pub type_counts: [u64; 5],
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl TransactionSummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut wallets = HashSet::new();
        let mut type_counts = [0u64; 5];
        let mut first: Option<DateTime<Utc>> = None;
        let mut last: Option<DateTime<Utc>> = None;

        for tx in transactions {
            wallets.insert(tx.wallet_address());
            type_counts[tx.transaction_type().index()] += 1;
            let t = tx.timestamp();
            first = Some(first.map_or(t, |f| f.min(t)));
            last = Some(last.map_or(t, |l| l.max(t)));
        }

        Self {
            total_transactions: transactions.len(),
            unique_wallets: wallets.len(),
            type_counts,
            first_timestamp: first,
            last_timestamp: last,
        }
    }

    pub fn count(&self, kind: TransactionType) -> u64 {
        self.type_counts[kind.index()]
    }
}

/// Wallet counts per 100-point score bin and per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDistribution {
    /// `bins[i]` counts scores in `[100*i, 100*(i+1))`; the last bin also
    /// holds 1000.
    pub bins: [usize; BIN_COUNT],
    /// Counts per [`ScoreCategory`], in `ScoreCategory::ALL` order.
    pub categories: [usize; 5],
}

impl ScoreDistribution {
    pub fn from_scores(scores: &[ScoreRecord]) -> Self {
        let mut bins = [0usize; BIN_COUNT];
        let mut categories = [0usize; 5];
        for s in scores {
            let bin = ((s.credit_score / BIN_WIDTH) as usize).min(BIN_COUNT - 1);
            bins[bin] += 1;
            if let Some(i) = ScoreCategory::ALL.iter().position(|c| *c == s.score_category) {
                categories[i] += 1;
            }
        }
        Self { bins, categories }
    }

    /// Human-readable bin labels, e.g. `"0-100"`, `"900-1000"`.
    pub fn bin_labels() -> [String; BIN_COUNT] {
        std::array::from_fn(|i| {
            let lo = i as u16 * BIN_WIDTH;
            format!("{}-{}", lo, lo + BIN_WIDTH)
        })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().sum()
    }
}

/// Mean behaviour of a group of wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    pub wallets: usize,
    pub mean_repay_to_borrow_ratio: Option<f64>,
    pub mean_days_active: Option<f64>,
    pub mean_liquidation_rate: Option<f64>,
}

impl CohortSummary {
    fn from_members(members: &[&WalletFeatures]) -> Self {
        let n = members.len();
        let mean = |get: fn(&WalletFeatures) -> f64| -> Option<f64> {
            (n > 0).then(|| members.iter().map(|f| get(f)).sum::<f64>() / n as f64)
        };
        Self {
            wallets: n,
            mean_repay_to_borrow_ratio: mean(|f| f.repay_to_borrow_ratio),
            mean_days_active: mean(|f| f.days_active as f64),
            mean_liquidation_rate: mean(|f| f.liquidation_rate),
        }
    }
}

/// High (`>= 700`) and low (`< 300`) scorer cohorts.
///
/// `features` and `scores` are joined on wallet address; scores without a
/// matching feature row are ignored.
pub fn scorer_cohorts(
    features: &[WalletFeatures],
    scores: &[ScoreRecord],
) -> (CohortSummary, CohortSummary) {
    let by_wallet: std::collections::HashMap<&str, &WalletFeatures> = features
        .iter()
        .map(|f| (f.wallet_address.as_str(), f))
        .collect();

    let mut high = Vec::new();
    let mut low = Vec::new();
    for s in scores {
        let Some(f) = by_wallet.get(s.wallet_address.as_str()) else {
            continue;
        };
        if s.credit_score >= HIGH_SCORER_FLOOR {
            high.push(*f);
        } else if s.credit_score < LOW_SCORER_CEILING {
            low.push(*f);
        }
    }

    (
        CohortSummary::from_members(&high),
        CohortSummary::from_members(&low),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::aggregate;
    use chrono::TimeZone;

    fn tx(wallet: &str, kind: TransactionType, secs: i64) -> Transaction {
        Transaction::new(wallet, kind, 1.0, Utc.timestamp_opt(secs, 0).unwrap()).unwrap()
    }

    fn record(wallet: &str, score: u16) -> ScoreRecord {
        ScoreRecord::from_prediction(wallet, score as f64)
    }

    #[test]
    fn transaction_summary_counts() {
        let txs = vec![
            tx("a", TransactionType::Deposit, 50),
            tx("a", TransactionType::Borrow, 10),
            tx("b", TransactionType::Deposit, 99),
        ];
        let s = TransactionSummary::from_transactions(&txs);
        assert_eq!(s.total_transactions, 3);
        assert_eq!(s.unique_wallets, 2);
        assert_eq!(s.count(TransactionType::Deposit), 2);
        assert_eq!(s.count(TransactionType::Borrow), 1);
        assert_eq!(s.count(TransactionType::Liquidation), 0);
        assert_eq!(s.first_timestamp, Some(Utc.timestamp_opt(10, 0).unwrap()));
        assert_eq!(s.last_timestamp, Some(Utc.timestamp_opt(99, 0).unwrap()));
    }

    #[test]
    fn empty_transaction_summary() {
        let s = TransactionSummary::from_transactions(&[]);
        assert_eq!(s.total_transactions, 0);
        assert_eq!(s.first_timestamp, None);
    }

    #[test]
    fn distribution_bins_include_upper_edge_in_last_bin() {
        let scores = vec![record("a", 0), record("b", 99), record("c", 100), record("d", 1000), record("e", 950)];
        let d = ScoreDistribution::from_scores(&scores);
        assert_eq!(d.bins[0], 2);
        assert_eq!(d.bins[1], 1);
        assert_eq!(d.bins[9], 2);
        assert_eq!(d.total(), 5);
        assert_eq!(d.categories, [3, 0, 0, 0, 2]);
    }

    #[test]
    fn bin_labels_cover_range() {
        let labels = ScoreDistribution::bin_labels();
        assert_eq!(labels[0], "0-100");
        assert_eq!(labels[9], "900-1000");
    }

    #[test]
    fn cohorts_split_on_thresholds() {
        let txs = vec![
            tx("hi", TransactionType::Deposit, 0),
            tx("mid", TransactionType::Deposit, 0),
            tx("lo", TransactionType::Liquidation, 0),
        ];
        let feats = aggregate(&txs).unwrap();
        let scores = vec![record("hi", 700), record("mid", 300), record("lo", 299), record("ghost", 900)];
        let (high, low) = scorer_cohorts(&feats, &scores);
        assert_eq!(high.wallets, 1);
        assert_eq!(high.mean_days_active, Some(1.0));
        assert_eq!(low.wallets, 1);
        assert_eq!(low.mean_liquidation_rate, Some(1.0));
    }

    #[test]
    fn empty_cohort_has_no_means() {
        let (high, low) = scorer_cohorts(&[], &[]);
        assert_eq!(high.wallets, 0);
        assert_eq!(high.mean_repay_to_borrow_ratio, None);
        assert_eq!(low.mean_days_active, None);
    }
}
