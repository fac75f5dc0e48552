//! Score report assembly and writers.
//!
//! One row per wallet: `wallet_address`, `credit_score`, `score_category`,
//! then every feature column in canonical order. Count columns and flags are
//! written as integers (flags as `0`/`1`).

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use credit_core::constants::{FEATURE_COLUMNS, FEATURE_COUNT, WALLET_COLUMN};
use credit_core::{ScoreCategory, ScoreRecord, WalletFeatures};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::info;

use crate::config::ReportFormat;
use crate::error::PipelineError;

/// Leading report columns ahead of the features.
pub const SCORE_COLUMNS: [&str; 3] = [WALLET_COLUMN, "credit_score", "score_category"];

/// A feature value as written to the report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Int(u64),
    Float(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(v) => s.serialize_u64(*v),
            Self::Float(v) => s.serialize_f64(*v),
        }
    }
}

/// Feature values in `FEATURE_COLUMNS` order.
pub fn cells(f: &WalletFeatures) -> [Cell; FEATURE_COUNT] {
    use Cell::{Float, Int};
    [
        Int(f.total_transactions),
        Float(f.total_volume),
        Float(f.avg_transaction_size),
        Int(f.days_active),
        Int(f.deposit_count),
        Int(f.borrow_count),
        Int(f.repay_count),
        Int(f.redeem_count),
        Int(f.liquidation_count),
        Float(f.repay_to_borrow_ratio),
        Float(f.deposit_to_borrow_ratio),
        Float(f.liquidation_rate),
        Float(f.avg_daily_transactions),
        Int(f.transaction_diversity),
        Int(f.is_long_term_user as u64),
        Int(f.is_active_user as u64),
    ]
}

/// A score joined with the feature vector it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub wallet_address: String,
    pub credit_score: u16,
    pub score_category: ScoreCategory,
    pub features: WalletFeatures,
}

impl Serialize for ReportRow {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(SCORE_COLUMNS.len() + FEATURE_COUNT))?;
        map.serialize_entry(SCORE_COLUMNS[0], &self.wallet_address)?;
        map.serialize_entry(SCORE_COLUMNS[1], &self.credit_score)?;
        map.serialize_entry(SCORE_COLUMNS[2], &self.score_category)?;
        for (name, cell) in FEATURE_COLUMNS.iter().zip(cells(&self.features)) {
            map.serialize_entry(name, &cell)?;
        }
        map.end()
    }
}

/// Join scores onto features by wallet address, in feature order.
///
/// Every wallet in `features` must have a score.
pub fn assemble(
    features: &[WalletFeatures],
    scores: &[ScoreRecord],
) -> Result<Vec<ReportRow>, PipelineError> {
    let by_wallet: HashMap<&str, &ScoreRecord> =
        scores.iter().map(|s| (s.wallet_address.as_str(), s)).collect();

    features
        .iter()
        .map(|f| {
            let s = by_wallet
                .get(f.wallet_address.as_str())
                .ok_or_else(|| PipelineError::MissingScore(f.wallet_address.clone()))?;
            Ok(ReportRow {
                wallet_address: f.wallet_address.clone(),
                credit_score: s.credit_score,
                score_category: s.score_category,
                features: f.clone(),
            })
        })
        .collect()
}

/// Write `rows` to `out` in `format`.
pub fn write_report<W: Write>(
    rows: &[ReportRow],
    format: ReportFormat,
    mut out: W,
) -> Result<(), PipelineError> {
    match format {
        ReportFormat::Csv => write_csv(rows, &mut out)?,
        ReportFormat::Jsonl => write_jsonl(rows, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and write the report into it.
pub fn write_report_file(
    rows: &[ReportRow],
    format: ReportFormat,
    path: &Path,
) -> Result<(), PipelineError> {
    let file = File::create(path)?;
    write_report(rows, format, BufWriter::new(file))?;
    info!(path = %path.display(), rows = rows.len(), %format, "wrote score report");
    Ok(())
}

fn write_csv<W: Write>(rows: &[ReportRow], out: &mut W) -> Result<(), PipelineError> {
    let header: Vec<&str> = SCORE_COLUMNS.iter().chain(FEATURE_COLUMNS.iter()).copied().collect();
    writeln!(out, "{}", header.join(","))?;

    for row in rows {
        write!(
            out,
            "{},{},{}",
            csv_field(&row.wallet_address),
            row.credit_score,
            csv_field(row.score_category.as_str())
        )?;
        for cell in cells(&row.features) {
            write!(out, ",{cell}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_jsonl<W: Write>(rows: &[ReportRow], out: &mut W) -> Result<(), PipelineError> {
    for row in rows {
        serde_json::to_writer(&mut *out, row).map_err(std::io::Error::from)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\"")).into()
    } else {
        s.into()
    }
}
