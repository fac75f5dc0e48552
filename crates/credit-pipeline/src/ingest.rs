//! Transaction log ingestion.
//!
//! The input is a JSON array of ledger records. Field names vary between
//! exports, so each field is looked up under a short list of aliases:
//!
//! | Field    | Accepted keys                                   |
//! |----------|-------------------------------------------------|
//! | wallet   | `wallet_address`, `userWallet`, `wallet`        |
//! | type     | `transaction_type`, `action`                    |
//! | amount   | `amount`, `actionData.amount` (number or string)|
//! | time     | `timestamp` (Unix seconds or RFC 3339)          |
//!
//! A file that is not a JSON array fails the load. Individual records that
//! cannot be turned into a valid [`Transaction`] are dropped and counted in
//! [`IngestStats`].

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use credit_core::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::PipelineError;

const WALLET_KEYS: [&str; 3] = ["wallet_address", "userWallet", "wallet"];
const TYPE_KEYS: [&str; 2] = ["transaction_type", "action"];
const AMOUNT_KEY: &str = "amount";
const ACTION_DATA_KEY: &str = "actionData";
const TIMESTAMP_KEY: &str = "timestamp";

/// Why a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Array element is not a JSON object.
    NotAnObject,
    MissingWallet,
    UnknownType,
    InvalidAmount,
    InvalidTimestamp,
}

/// Counters from one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub records: usize,
    pub kept: usize,
    pub not_an_object: usize,
    pub missing_wallet: usize,
    pub unknown_type: usize,
    pub invalid_amount: usize,
    pub invalid_timestamp: usize,
}

impl IngestStats {
    pub fn dropped(&self) -> usize {
        self.records - self.kept
    }

    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::NotAnObject => self.not_an_object += 1,
            DropReason::MissingWallet => self.missing_wallet += 1,
            DropReason::UnknownType => self.unknown_type += 1,
            DropReason::InvalidAmount => self.invalid_amount += 1,
            DropReason::InvalidTimestamp => self.invalid_timestamp += 1,
        }
    }
}

/// Read and clean the transaction log at `path`.
pub fn load_transactions(path: &Path) -> Result<(Vec<Transaction>, IngestStats), PipelineError> {
    let text = std::fs::read_to_string(path)?;
    let (transactions, stats) = parse_transactions(&text)?;

    let wallets: HashSet<&str> = transactions.iter().map(|t| t.wallet_address()).collect();
    info!(
        path = %path.display(),
        transactions = transactions.len(),
        wallets = wallets.len(),
        "loaded {} transactions for {} wallets",
        transactions.len(),
        wallets.len()
    );
    Ok((transactions, stats))
}

/// Parse and clean a JSON transaction log held in memory.
pub fn parse_transactions(json: &str) -> Result<(Vec<Transaction>, IngestStats), PipelineError> {
    let value: Value = serde_json::from_str(json).map_err(|e| PipelineError::Parse(e.to_string()))?;
    let Value::Array(records) = value else {
        return Err(PipelineError::Parse("expected a JSON array of transactions".into()));
    };

    let mut stats = IngestStats {
        records: records.len(),
        ..IngestStats::default()
    };
    let mut transactions = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        match parse_record(record) {
            Ok(tx) => transactions.push(tx),
            Err(reason) => {
                debug!(record = i, ?reason, "dropped record");
                stats.record_drop(reason);
            }
        }
    }
    stats.kept = transactions.len();

    if stats.dropped() > 0 {
        warn!(
            dropped = stats.dropped(),
            not_an_object = stats.not_an_object,
            missing_wallet = stats.missing_wallet,
            unknown_type = stats.unknown_type,
            invalid_amount = stats.invalid_amount,
            invalid_timestamp = stats.invalid_timestamp,
            "dropped invalid transaction records"
        );
    }
    Ok((transactions, stats))
}

fn parse_record(record: &Value) -> Result<Transaction, DropReason> {
    let Value::Object(obj) = record else {
        return Err(DropReason::NotAnObject);
    };

    let wallet = first_str(obj, &WALLET_KEYS)
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or(DropReason::MissingWallet)?;
    let kind: TransactionType = first_str(obj, &TYPE_KEYS)
        .and_then(|t| t.parse().ok())
        .ok_or(DropReason::UnknownType)?;
    let amount = amount(obj)
        .filter(|a| a.is_finite() && *a > 0.0)
        .ok_or(DropReason::InvalidAmount)?;
    let timestamp = obj
        .get(TIMESTAMP_KEY)
        .and_then(timestamp)
        .ok_or(DropReason::InvalidTimestamp)?;

    Transaction::new(wallet, kind, amount, timestamp).map_err(|_| DropReason::InvalidAmount)
}

fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

fn amount(obj: &Map<String, Value>) -> Option<f64> {
    let raw = obj.get(AMOUNT_KEY).or_else(|| {
        obj.get(ACTION_DATA_KEY)
            .and_then(Value::as_object)
            .and_then(|d| d.get(AMOUNT_KEY))
    })?;
    number(raw)
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(n) => n.as_i64().and_then(|s| Utc.timestamp_opt(s, 0).single()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return Utc.timestamp_opt(secs, 0).single();
            }
            DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
        }
        _ => None,
    }
}
