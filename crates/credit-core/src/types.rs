//! Core data types: transactions, wallet feature vectors, score records.
//!
//! Amounts are plain `f64` token units as reported by the ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::ScoreCategory;
use crate::constants::{FEATURE_COUNT, SCORE_MAX, SCORE_MIN};
use crate::error::TransactionError;

/// Lending-protocol action. The vocabulary is fixed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Borrow,
    Repay,
    Redeem,
    Liquidation,
}

impl TransactionType {
    /// All transaction types, in feature-column order.
    pub const ALL: [TransactionType; 5] = [
        Self::Deposit,
        Self::Borrow,
        Self::Repay,
        Self::Redeem,
        Self::Liquidation,
    ];

    /// Position of this type in [`Self::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Deposit => 0,
            Self::Borrow => 1,
            Self::Repay => 2,
            Self::Redeem => 3,
            Self::Liquidation => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::Redeem => "redeem",
            Self::Liquidation => "liquidation",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = TransactionError;

    /// Parse a ledger action name, case-insensitively.
    ///
    /// Accepts the protocol's raw event names (`redeemunderlying`,
    /// `liquidationcall`) as well as the short forms.
    ///
    /// # Examples
    ///
    /// ```
    /// use credit_core::TransactionType;
    ///
    /// assert_eq!("Deposit".parse::<TransactionType>().unwrap(), TransactionType::Deposit);
    /// assert_eq!("redeemunderlying".parse::<TransactionType>().unwrap(), TransactionType::Redeem);
    /// assert_eq!("liquidationcall".parse::<TransactionType>().unwrap(), TransactionType::Liquidation);
    /// assert!("swap".parse::<TransactionType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(Self::Deposit),
            "borrow" => Ok(Self::Borrow),
            "repay" => Ok(Self::Repay),
            "redeem" | "redeemunderlying" => Ok(Self::Redeem),
            "liquidation" | "liquidationcall" => Ok(Self::Liquidation),
            other => Err(TransactionError::UnknownType(other.to_string())),
        }
    }
}

/// A single cleaned ledger entry.
///
/// # Invariants
///
/// * `wallet_address` is non-empty
/// * `amount` is finite and strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    wallet_address: String,
    transaction_type: TransactionType,
    amount: f64,
    timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction, rejecting empty wallets and non-positive amounts.
    pub fn new(
        wallet_address: impl Into<String>,
        transaction_type: TransactionType,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, TransactionError> {
        let wallet_address = wallet_address.into();
        if wallet_address.trim().is_empty() {
            return Err(TransactionError::EmptyWallet);
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(TransactionError::InvalidAmount(amount));
        }
        Ok(Self {
            wallet_address,
            transaction_type,
            amount,
            timestamp,
        })
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Per-wallet feature vector produced by [`crate::features::aggregate`].
///
/// Every ratio has a denominator floored at one or taken from the wallet's own
/// transaction count, so all fields are finite for any aggregated wallet.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WalletFeatures {
    pub wallet_address: String,
    pub total_transactions: u64,
    pub total_volume: f64,
    pub avg_transaction_size: f64,
    /// Whole days between first and last transaction, plus one.
    pub days_active: u64,
    pub deposit_count: u64,
    pub borrow_count: u64,
    pub repay_count: u64,
    pub redeem_count: u64,
    pub liquidation_count: u64,
    pub repay_to_borrow_ratio: f64,
    pub deposit_to_borrow_ratio: f64,
    pub liquidation_rate: f64,
    pub avg_daily_transactions: f64,
    /// Number of distinct transaction types seen (1..=5).
    pub transaction_diversity: u64,
    pub is_long_term_user: bool,
    pub is_active_user: bool,
}

impl WalletFeatures {
    /// Count of transactions of the given type.
    pub fn type_count(&self, kind: TransactionType) -> u64 {
        match kind {
            TransactionType::Deposit => self.deposit_count,
            TransactionType::Borrow => self.borrow_count,
            TransactionType::Repay => self.repay_count,
            TransactionType::Redeem => self.redeem_count,
            TransactionType::Liquidation => self.liquidation_count,
        }
    }

    /// Numeric column values in [`crate::constants::FEATURE_COLUMNS`] order.
    /// Flags are encoded as `0.0` / `1.0`.
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.total_transactions as f64,
            self.total_volume,
            self.avg_transaction_size,
            self.days_active as f64,
            self.deposit_count as f64,
            self.borrow_count as f64,
            self.repay_count as f64,
            self.redeem_count as f64,
            self.liquidation_count as f64,
            self.repay_to_borrow_ratio,
            self.deposit_to_borrow_ratio,
            self.liquidation_rate,
            self.avg_daily_transactions,
            self.transaction_diversity as f64,
            flag(self.is_long_term_user),
            flag(self.is_active_user),
        ]
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

/// Final score for one wallet.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScoreRecord {
    pub wallet_address: String,
    /// Rounded, clamped model prediction.
    pub credit_score: u16,
    pub score_category: ScoreCategory,
}

impl ScoreRecord {
    /// Build a record from a raw model prediction.
    ///
    /// The prediction is clamped to `0..=1000` and rounded half-to-even. The
    /// category is taken from the clamped prediction before rounding, so a
    /// prediction of 799.6 reports 800 but stays `Good`.
    ///
    /// # Examples
    ///
    /// ```
    /// use credit_core::{ScoreCategory, ScoreRecord};
    ///
    /// let r = ScoreRecord::from_prediction("0xabc", 799.6);
    /// assert_eq!(r.credit_score, 800);
    /// assert_eq!(r.score_category, ScoreCategory::Good);
    ///
    /// let r = ScoreRecord::from_prediction("0xabc", -12.0);
    /// assert_eq!(r.credit_score, 0);
    /// ```
    pub fn from_prediction(wallet_address: impl Into<String>, prediction: f64) -> Self {
        let credit_score = round_score(prediction);
        Self {
            wallet_address: wallet_address.into(),
            credit_score,
            score_category: ScoreCategory::from_score(
                prediction.clamp(SCORE_MIN as f64, SCORE_MAX as f64),
            ),
        }
    }
}

/// Clamp and round a continuous score to the reported integer range.
/// NaN maps to [`SCORE_MIN`].
pub fn round_score(prediction: f64) -> u16 {
    if prediction.is_nan() {
        return SCORE_MIN;
    }
    prediction
        .clamp(SCORE_MIN as f64, SCORE_MAX as f64)
        .round_ties_even() as u16
}
