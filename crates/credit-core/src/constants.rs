//! Scoring constants. Scores are dimensionless integers in `0..=1000`.

/// Lowest possible score (heuristic label, prediction, and report).
pub const SCORE_MIN: u16 = 0;

/// Highest possible score (heuristic label, prediction, and report).
pub const SCORE_MAX: u16 = 1000;

/// Starting point of the heuristic rule table before any adjustment.
pub const NEUTRAL_SCORE: i32 = 500;

/// Wallets active for strictly more than this many days are long-term users.
pub const LONG_TERM_DAYS: u64 = 30;

/// Wallets with strictly more than this many transactions are active users.
pub const ACTIVE_USER_TRANSACTIONS: u64 = 10;

/// Seconds in one calendar day.
pub const SECS_PER_DAY: i64 = 86_400;

/// Lower bound (inclusive) of the `Excellent` category.
pub const EXCELLENT_FLOOR: f64 = 800.0;
/// Lower bound (inclusive) of the `Good` category.
pub const GOOD_FLOOR: f64 = 600.0;
/// Lower bound (inclusive) of the `Fair` category.
pub const FAIR_FLOOR: f64 = 400.0;
/// Lower bound (inclusive) of the `Poor` category.
pub const POOR_FLOOR: f64 = 200.0;

/// Number of columns in a wallet feature vector.
pub const FEATURE_COUNT: usize = 16;

/// Canonical feature column names, in the order [`crate::WalletFeatures::values`]
/// emits them and the report writes them.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "total_transactions",
    "total_volume",
    "avg_transaction_size",
    "days_active",
    "deposit_count",
    "borrow_count",
    "repay_count",
    "redeem_count",
    "liquidation_count",
    "repay_to_borrow_ratio",
    "deposit_to_borrow_ratio",
    "liquidation_rate",
    "avg_daily_transactions",
    "transaction_diversity",
    "is_long_term_user",
    "is_active_user",
];

/// Column holding the wallet identifier in feature tables and reports.
pub const WALLET_COLUMN: &str = "wallet_address";
