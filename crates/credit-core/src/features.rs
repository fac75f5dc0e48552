//! Wallet feature aggregation and named feature tables.
//!
//! [`aggregate`] reduces the full transaction set to one [`WalletFeatures`] per
//! distinct wallet. [`FeatureTable`] is the column-named matrix view the
//! scoring model is fitted on and applied to.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::constants::{ACTIVE_USER_TRANSACTIONS, FEATURE_COLUMNS, LONG_TERM_DAYS};
use crate::error::FeatureError;
use crate::types::{Transaction, WalletFeatures};

/// Running totals for one wallet while scanning the transaction set.
struct WalletAccumulator {
    wallet_address: String,
    counts: [u64; 5],
    volume: f64,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl WalletAccumulator {
    fn new(tx: &Transaction) -> Self {
        Self {
            wallet_address: tx.wallet_address().to_string(),
            counts: [0; 5],
            volume: 0.0,
            first_seen: tx.timestamp(),
            last_seen: tx.timestamp(),
        }
    }

    fn push(&mut self, tx: &Transaction) {
        self.counts[tx.transaction_type().index()] += 1;
        self.volume += tx.amount();
        self.first_seen = self.first_seen.min(tx.timestamp());
        self.last_seen = self.last_seen.max(tx.timestamp());
    }

    fn finish(self) -> WalletFeatures {
        let [deposit, borrow, repay, redeem, liquidation] = self.counts;
        // Never zero: an accumulator is created from its first transaction.
        let total: u64 = self.counts.iter().sum();
        let days_active = (self.last_seen - self.first_seen).num_days().max(0) as u64 + 1;
        let borrow_floor = borrow.max(1) as f64;

        WalletFeatures {
            wallet_address: self.wallet_address,
            total_transactions: total,
            total_volume: self.volume,
            avg_transaction_size: self.volume / total as f64,
            days_active,
            deposit_count: deposit,
            borrow_count: borrow,
            repay_count: repay,
            redeem_count: redeem,
            liquidation_count: liquidation,
            repay_to_borrow_ratio: repay as f64 / borrow_floor,
            deposit_to_borrow_ratio: deposit as f64 / borrow_floor,
            liquidation_rate: liquidation as f64 / total as f64,
            avg_daily_transactions: total as f64 / days_active.max(1) as f64,
            transaction_diversity: self.counts.iter().filter(|c| **c > 0).count() as u64,
            is_long_term_user: days_active > LONG_TERM_DAYS,
            is_active_user: total > ACTIVE_USER_TRANSACTIONS,
        }
    }
}

/// Group transactions by wallet and compute one feature vector per wallet.
///
/// Wallets are emitted in order of first appearance. Returns
/// [`FeatureError::NoWallets`] for an empty transaction set.
pub fn aggregate(transactions: &[Transaction]) -> Result<Vec<WalletFeatures>, FeatureError> {
    if transactions.is_empty() {
        return Err(FeatureError::NoWallets);
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut wallets: Vec<WalletAccumulator> = Vec::new();

    for tx in transactions {
        let slot = match index.get(tx.wallet_address()) {
            Some(&i) => i,
            None => {
                index.insert(tx.wallet_address(), wallets.len());
                wallets.push(WalletAccumulator::new(tx));
                wallets.len() - 1
            }
        };
        wallets[slot].push(tx);
    }

    debug!(
        transactions = transactions.len(),
        wallets = wallets.len(),
        "aggregated wallet features"
    );

    Ok(wallets.into_iter().map(WalletAccumulator::finish).collect())
}

/// Row-major numeric table with named columns, one row per wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    wallets: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Build a table from explicit parts, validating shape and column names.
    pub fn new(
        columns: Vec<String>,
        wallets: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, FeatureError> {
        let mut seen = HashSet::new();
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(FeatureError::DuplicateColumn(c.clone()));
            }
        }
        if wallets.len() != rows.len() {
            return Err(FeatureError::WalletCount {
                wallets: wallets.len(),
                rows: rows.len(),
            });
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(FeatureError::RowWidth {
                    row: i,
                    expected: columns.len(),
                    got: row.len(),
                });
            }
        }
        Ok(Self {
            columns,
            wallets,
            rows,
        })
    }

    /// Table over the canonical feature columns.
    pub fn from_features(features: &[WalletFeatures]) -> Self {
        Self {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            wallets: features.iter().map(|f| f.wallet_address.clone()).collect(),
            rows: features.iter().map(|f| f.values().to_vec()).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn wallets(&self) -> &[String] {
        &self.wallets
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Project every row onto `names`, in that order.
    ///
    /// Fails with [`FeatureError::MissingColumns`] listing every requested
    /// name the table lacks.
    pub fn select(&self, names: &[String]) -> Result<Vec<Vec<f64>>, FeatureError> {
        let mut positions = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(i) => positions.push(i),
                None => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(FeatureError::MissingColumns(missing));
        }
        Ok(self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&i| row[i]).collect())
            .collect())
    }

    /// Copy of this table with `name` removed. Unknown names are a no-op.
    pub fn without_column(&self, name: &str) -> Self {
        let Some(drop) = self.column_index(name) else {
            return self.clone();
        };
        let mut columns = self.columns.clone();
        columns.remove(drop);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut r = row.clone();
                r.remove(drop);
                r
            })
            .collect();
        Self {
            columns,
            wallets: self.wallets.clone(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FEATURE_COUNT;
    use crate::types::TransactionType;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const DAY: i64 = 86_400;

    fn tx(wallet: &str, kind: TransactionType, amount: f64, secs: i64) -> Transaction {
        Transaction::new(wallet, kind, amount, Utc.timestamp_opt(secs, 0).unwrap()).unwrap()
    }

    #[test]
    fn empty_input_is_no_wallets() {
        assert_eq!(aggregate(&[]).unwrap_err(), FeatureError::NoWallets);
    }

    #[test]
    fn one_row_per_wallet_in_first_seen_order() {
        let txs = vec![
            tx("b", TransactionType::Deposit, 1.0, 0),
            tx("a", TransactionType::Deposit, 1.0, 0),
            tx("b", TransactionType::Borrow, 1.0, DAY),
            tx("c", TransactionType::Repay, 1.0, 0),
        ];
        let feats = aggregate(&txs).unwrap();
        let ids: Vec<_> = feats.iter().map(|f| f.wallet_address.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn single_transaction_wallet() {
        let feats = aggregate(&[tx("w", TransactionType::Deposit, 250.0, 1_000)]).unwrap();
        let f = &feats[0];
        assert_eq!(f.total_transactions, 1);
        assert_eq!(f.total_volume, 250.0);
        assert_eq!(f.avg_transaction_size, 250.0);
        assert_eq!(f.days_active, 1);
        assert_eq!(f.deposit_count, 1);
        assert_eq!(f.transaction_diversity, 1);
        assert_eq!(f.avg_daily_transactions, 1.0);
        assert!(!f.is_long_term_user);
        assert!(!f.is_active_user);
    }

    #[test]
    fn no_borrows_gives_zero_repay_ratio() {
        let feats = aggregate(&[tx("w", TransactionType::Deposit, 1.0, 0)]).unwrap();
        assert_eq!(feats[0].borrow_count, 0);
        assert_eq!(feats[0].repay_count, 0);
        assert_eq!(feats[0].repay_to_borrow_ratio, 0.0);
        assert_eq!(feats[0].deposit_to_borrow_ratio, 1.0);
    }

    #[test]
    fn repays_without_borrows_use_floored_denominator() {
        let txs = vec![
            tx("w", TransactionType::Repay, 1.0, 0),
            tx("w", TransactionType::Repay, 1.0, 0),
        ];
        assert_eq!(aggregate(&txs).unwrap()[0].repay_to_borrow_ratio, 2.0);
    }

    #[test]
    fn days_active_truncates_partial_days() {
        // 2 days and 23 hours apart -> 2 whole days -> days_active = 3.
        let txs = vec![
            tx("w", TransactionType::Deposit, 1.0, 0),
            tx("w", TransactionType::Deposit, 1.0, 2 * DAY + 23 * 3_600),
        ];
        assert_eq!(aggregate(&txs).unwrap()[0].days_active, 3);
    }

    #[test]
    fn days_active_ignores_input_order() {
        let txs = vec![
            tx("w", TransactionType::Deposit, 1.0, 40 * DAY),
            tx("w", TransactionType::Deposit, 1.0, 0),
            tx("w", TransactionType::Deposit, 1.0, 10 * DAY),
        ];
        let f = &aggregate(&txs).unwrap()[0];
        assert_eq!(f.days_active, 41);
        assert!(f.is_long_term_user);
    }

    #[test]
    fn long_term_threshold_is_strict() {
        let txs = vec![
            tx("w", TransactionType::Deposit, 1.0, 0),
            tx("w", TransactionType::Deposit, 1.0, 29 * DAY),
        ];
        let f = &aggregate(&txs).unwrap()[0];
        assert_eq!(f.days_active, 30);
        assert!(!f.is_long_term_user);
    }

    #[test]
    fn active_user_threshold_is_strict() {
        let ten: Vec<_> = (0..10).map(|i| tx("w", TransactionType::Deposit, 1.0, i)).collect();
        assert!(!aggregate(&ten).unwrap()[0].is_active_user);
        let eleven: Vec<_> = (0..11).map(|i| tx("w", TransactionType::Deposit, 1.0, i)).collect();
        assert!(aggregate(&eleven).unwrap()[0].is_active_user);
    }

    #[test]
    fn sixty_transactions_over_ten_days() {
        let mut txs = Vec::new();
        for i in 0..20 {
            txs.push(tx("w", TransactionType::Deposit, 10.0, (i % 10) * DAY));
            txs.push(tx("w", TransactionType::Borrow, 5.0, (i % 10) * DAY));
        }
        for i in 0..19 {
            txs.push(tx("w", TransactionType::Repay, 5.0, (i % 10) * DAY));
        }
        txs.push(tx("w", TransactionType::Liquidation, 1.0, 9 * DAY));

        let f = &aggregate(&txs).unwrap()[0];
        assert_eq!(f.total_transactions, 60);
        assert_eq!(f.days_active, 10);
        assert!((f.liquidation_rate - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(f.avg_daily_transactions, 6.0);
        assert!((f.repay_to_borrow_ratio - 0.95).abs() < 1e-12);
        assert_eq!(f.transaction_diversity, 4);
        assert_eq!(f.total_volume, 20.0 * 10.0 + 20.0 * 5.0 + 19.0 * 5.0 + 1.0);
    }

    #[test]
    fn table_from_features_uses_canonical_columns() {
        let feats = aggregate(&[tx("w", TransactionType::Deposit, 1.0, 0)]).unwrap();
        let table = FeatureTable::from_features(&feats);
        assert_eq!(table.columns().len(), FEATURE_COUNT);
        assert_eq!(table.columns()[0], "total_transactions");
        assert_eq!(table.wallets(), &["w".to_string()]);
        assert_eq!(table.rows()[0], feats[0].values().to_vec());
    }

    #[test]
    fn select_reorders_by_name() {
        let table = FeatureTable::new(
            vec!["a".into(), "b".into()],
            vec!["w".into()],
            vec![vec![1.0, 2.0]],
        )
        .unwrap();
        let rows = table.select(&["b".into(), "a".into()]).unwrap();
        assert_eq!(rows, vec![vec![2.0, 1.0]]);
    }

    #[test]
    fn select_reports_all_missing_columns() {
        let table = FeatureTable::new(vec!["a".into()], vec![], vec![]).unwrap();
        let err = table.select(&["a".into(), "x".into(), "y".into()]).unwrap_err();
        assert_eq!(err, FeatureError::MissingColumns(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn without_column_drops_values() {
        let table = FeatureTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec!["w".into()],
            vec![vec![1.0, 2.0, 3.0]],
        )
        .unwrap();
        let t = table.without_column("b");
        assert_eq!(t.columns(), &["a".to_string(), "c".to_string()]);
        assert_eq!(t.rows()[0], vec![1.0, 3.0]);
        assert_eq!(table.without_column("zzz"), table);
    }

    #[test]
    fn new_rejects_bad_shapes() {
        let dup = FeatureTable::new(vec!["a".into(), "a".into()], vec![], vec![]);
        assert_eq!(dup.unwrap_err(), FeatureError::DuplicateColumn("a".into()));

        let width = FeatureTable::new(vec!["a".into()], vec!["w".into()], vec![vec![]]);
        assert_eq!(
            width.unwrap_err(),
            FeatureError::RowWidth { row: 0, expected: 1, got: 0 }
        );

        let ids = FeatureTable::new(vec!["a".into()], vec![], vec![vec![1.0]]);
        assert_eq!(ids.unwrap_err(), FeatureError::WalletCount { wallets: 0, rows: 1 });
    }

    fn arb_transactions() -> impl Strategy<Value = Vec<Transaction>> {
        prop::collection::vec(
            (0u8..6, 0usize..5, 0.01f64..1e6, 0i64..400 * DAY),
            1..200,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(w, k, amount, secs)| {
                    tx(&format!("w{w}"), TransactionType::ALL[k], amount, secs)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn type_counts_partition_total(txs in arb_transactions()) {
            let feats = aggregate(&txs).unwrap();
            let total: u64 = feats.iter().map(|f| f.total_transactions).sum();
            prop_assert_eq!(total as usize, txs.len());
            for f in &feats {
                let sum: u64 = TransactionType::ALL.iter().map(|t| f.type_count(*t)).sum();
                prop_assert_eq!(sum, f.total_transactions);
                let nonzero = TransactionType::ALL.iter().filter(|t| f.type_count(**t) > 0).count();
                prop_assert_eq!(nonzero as u64, f.transaction_diversity);
            }
        }

        #[test]
        fn no_duplicate_wallets_and_all_values_finite(txs in arb_transactions()) {
            let feats = aggregate(&txs).unwrap();
            let ids: HashSet<_> = feats.iter().map(|f| f.wallet_address.clone()).collect();
            prop_assert_eq!(ids.len(), feats.len());
            let input_ids: HashSet<_> = txs.iter().map(|t| t.wallet_address().to_string()).collect();
            prop_assert_eq!(ids, input_ids);
            for f in &feats {
                prop_assert!(f.days_active >= 1);
                prop_assert!((1..=5).contains(&f.transaction_diversity));
                prop_assert!(f.values().iter().all(|v| v.is_finite()));
                prop_assert!((0.0..=1.0).contains(&f.liquidation_rate));
            }
        }
    }
}
