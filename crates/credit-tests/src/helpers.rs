//! Shared builders for integration tests.

use chrono::{DateTime, TimeZone, Utc};
use credit_core::{Transaction, TransactionType};
use credit_model::ModelConfig;
use serde_json::{json, Value};

pub const DAY: i64 = 86_400;

/// Base instant for synthetic ledgers (2021-01-01T00:00:00Z).
pub const EPOCH: i64 = 1_609_459_200;

pub fn ts(day: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(EPOCH + day * DAY, 0).unwrap()
}

pub fn tx(wallet: &str, kind: TransactionType, amount: f64, day: i64) -> Transaction {
    Transaction::new(wallet, kind, amount, ts(day)).unwrap()
}

/// Activity shape of one synthetic wallet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Profile {
    pub deposits: u32,
    pub borrows: u32,
    pub repays: u32,
    pub redeems: u32,
    pub liquidations: u32,
    /// Days between the first and last transaction.
    pub span_days: i64,
}

impl Profile {
    /// Transactions spread evenly over `span_days`, starting at `start_day`.
    pub fn transactions(&self, wallet: &str, start_day: i64) -> Vec<Transaction> {
        let kinds = [
            (TransactionType::Deposit, self.deposits),
            (TransactionType::Borrow, self.borrows),
            (TransactionType::Repay, self.repays),
            (TransactionType::Redeem, self.redeems),
            (TransactionType::Liquidation, self.liquidations),
        ];
        let total: u32 = kinds.iter().map(|(_, n)| n).sum();
        let mut out = Vec::with_capacity(total as usize);
        let mut k = 0i64;
        for (kind, n) in kinds {
            for _ in 0..n {
                let day = if total > 1 { start_day + self.span_days * k / (total as i64 - 1) } else { start_day };
                out.push(tx(wallet, kind, 10.0 + (k % 7) as f64, day));
                k += 1;
            }
        }
        out
    }
}

/// A deterministic ledger of `wallets` wallets with varied profiles.
pub fn synthetic_ledger(wallets: usize) -> Vec<Transaction> {
    (0..wallets)
        .flat_map(|w| {
            let w32 = w as u32;
            let profile = Profile {
                deposits: 1 + w32 % 4,
                borrows: 1 + w32 % 5,
                repays: (w32 * 7) % 8,
                redeems: w32 % 3,
                liquidations: u32::from(w % 11 == 0),
                span_days: ((w * 13) % 150) as i64,
            };
            profile.transactions(&format!("0x{w:040x}"), (w % 30) as i64)
        })
        .collect()
}

/// Encode transactions as a JSON log, alternating between the canonical field
/// names and the protocol export layout.
pub fn ledger_json(transactions: &[Transaction]) -> String {
    let records: Vec<Value> = transactions
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if i % 2 == 0 {
                json!({
                    "wallet_address": t.wallet_address(),
                    "transaction_type": t.transaction_type().as_str(),
                    "amount": t.amount(),
                    "timestamp": t.timestamp().timestamp(),
                })
            } else {
                json!({
                    "userWallet": t.wallet_address(),
                    "action": t.transaction_type().as_str(),
                    "actionData": { "amount": t.amount().to_string() },
                    "timestamp": t.timestamp().to_rfc3339(),
                })
            }
        })
        .collect();
    Value::Array(records).to_string()
}

/// Small forest for fast tests.
pub fn small_config() -> ModelConfig {
    ModelConfig {
        n_estimators: 10,
        ..ModelConfig::default()
    }
}
