//! Rule-based training labels.
//!
//! The rule table is a list of independent tiers. Within a tier the rungs are
//! evaluated top to bottom and only the first match applies; every tier
//! contributes at most one adjustment. The sum is saturated to `0..=1000`.
//!
//! | Tier            | Condition                       | Adjustment |
//! |-----------------|---------------------------------|------------|
//! | repayment       | repay_to_borrow_ratio > 1.0     | +200       |
//! |                 | repay_to_borrow_ratio > 0.8     | +100       |
//! | tenure          | days_active > 90                | +150       |
//! |                 | days_active > 30                | +75        |
//! | activity        | total_transactions > 50         | +100       |
//! |                 | total_transactions > 20         | +50        |
//! | loyalty         | is_long_term_user               | +50        |
//! | diversity       | transaction_diversity > 3       | +50        |
//! | liquidation     | liquidation_rate > 0.05         | -400       |
//! |                 | liquidation_rate > 0.02         | -200       |
//! | under-repayment | repay_to_borrow_ratio < 0.5     | -200       |
//! | bot-like        | avg_daily_transactions > 10     | -100       |
//!
//! These labels only train the regressor; they are never reported.

use crate::constants::{NEUTRAL_SCORE, SCORE_MAX, SCORE_MIN};
use crate::types::WalletFeatures;

/// Feature a rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    RepayToBorrowRatio,
    DaysActive,
    TotalTransactions,
    LongTermUser,
    TransactionDiversity,
    LiquidationRate,
    AvgDailyTransactions,
}

impl Field {
    fn read(&self, f: &WalletFeatures) -> f64 {
        match self {
            Self::RepayToBorrowRatio => f.repay_to_borrow_ratio,
            Self::DaysActive => f.days_active as f64,
            Self::TotalTransactions => f.total_transactions as f64,
            Self::LongTermUser => {
                if f.is_long_term_user {
                    1.0
                } else {
                    0.0
                }
            }
            Self::TransactionDiversity => f.transaction_diversity as f64,
            Self::LiquidationRate => f.liquidation_rate,
            Self::AvgDailyTransactions => f.avg_daily_transactions,
        }
    }
}

/// Strict comparison against a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    Above(f64),
    Below(f64),
}

/// One rung of a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub field: Field,
    pub condition: Condition,
    pub adjustment: i32,
}

impl Rule {
    const fn above(field: Field, threshold: f64, adjustment: i32) -> Self {
        Self {
            field,
            condition: Condition::Above(threshold),
            adjustment,
        }
    }

    const fn below(field: Field, threshold: f64, adjustment: i32) -> Self {
        Self {
            field,
            condition: Condition::Below(threshold),
            adjustment,
        }
    }

    pub fn matches(&self, features: &WalletFeatures) -> bool {
        let v = self.field.read(features);
        match self.condition {
            Condition::Above(t) => v > t,
            Condition::Below(t) => v < t,
        }
    }
}

/// Ordered rungs; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub name: &'static str,
    pub rungs: &'static [Rule],
}

impl Tier {
    /// Adjustment contributed by this tier, or 0 when no rung matches.
    pub fn adjustment(&self, features: &WalletFeatures) -> i32 {
        self.rungs
            .iter()
            .find(|r| r.matches(features))
            .map_or(0, |r| r.adjustment)
    }
}

/// The production rule table.
pub const RULES: &[Tier] = &[
    Tier {
        name: "repayment",
        rungs: &[
            Rule::above(Field::RepayToBorrowRatio, 1.0, 200),
            Rule::above(Field::RepayToBorrowRatio, 0.8, 100),
        ],
    },
    Tier {
        name: "tenure",
        rungs: &[
            Rule::above(Field::DaysActive, 90.0, 150),
            Rule::above(Field::DaysActive, 30.0, 75),
        ],
    },
    Tier {
        name: "activity",
        rungs: &[
            Rule::above(Field::TotalTransactions, 50.0, 100),
            Rule::above(Field::TotalTransactions, 20.0, 50),
        ],
    },
    Tier {
        name: "loyalty",
        rungs: &[Rule::above(Field::LongTermUser, 0.0, 50)],
    },
    Tier {
        name: "diversity",
        rungs: &[Rule::above(Field::TransactionDiversity, 3.0, 50)],
    },
    Tier {
        name: "liquidation",
        rungs: &[
            Rule::above(Field::LiquidationRate, 0.05, -400),
            Rule::above(Field::LiquidationRate, 0.02, -200),
        ],
    },
    Tier {
        name: "under-repayment",
        rungs: &[Rule::below(Field::RepayToBorrowRatio, 0.5, -200)],
    },
    Tier {
        name: "bot-like",
        rungs: &[Rule::above(Field::AvgDailyTransactions, 10.0, -100)],
    },
];

/// Unclamped sum of the neutral score and every tier's adjustment.
pub fn raw_score(features: &WalletFeatures) -> i32 {
    RULES
        .iter()
        .fold(NEUTRAL_SCORE, |acc, tier| acc + tier.adjustment(features))
}

/// Heuristic training label in `0..=1000`.
pub fn label(features: &WalletFeatures) -> u16 {
    raw_score(features).clamp(SCORE_MIN as i32, SCORE_MAX as i32) as u16
}

/// Labels for a batch, as regression targets.
pub fn labels(features: &[WalletFeatures]) -> Vec<f64> {
    features.iter().map(|f| label(f) as f64).collect()
}
