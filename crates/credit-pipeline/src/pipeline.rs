//! Fit and apply phases.
//!
//! ```text
//! load_transactions ─► aggregate ─► fit ─► ScoringModel ─► apply ─► assemble
//!                                            │     ▲
//!                                          save   load
//! ```
//!
//! [`fit`] and [`apply`] are independent: a model fitted on one dataset (and
//! possibly persisted) can score any other.

use std::path::Path;

use credit_core::features::aggregate;
use credit_core::summary::{scorer_cohorts, CohortSummary, ScoreDistribution, TransactionSummary};
use credit_core::{FeatureTable, ScoreCategory, ScoreRecord, Transaction, WalletFeatures};
use credit_model::{ModelConfig, ScoringModel, TrainingReport};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;
use crate::ingest::{load_transactions, IngestStats};

/// A cleaned dataset and its per-wallet features.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    pub stats: IngestStats,
    pub features: Vec<WalletFeatures>,
}

impl Dataset {
    /// Load, clean and aggregate the transaction log at `path`.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let (transactions, stats) = load_transactions(path)?;
        Self::from_transactions(transactions, stats)
    }

    pub fn from_transactions(
        transactions: Vec<Transaction>,
        stats: IngestStats,
    ) -> Result<Self, PipelineError> {
        let features = aggregate(&transactions)?;
        Ok(Self {
            transactions,
            stats,
            features,
        })
    }

    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary::from_transactions(&self.transactions)
    }
}

/// Train a fresh model on `features`.
pub fn fit(
    features: &[WalletFeatures],
    config: &ModelConfig,
) -> Result<(ScoringModel, TrainingReport), PipelineError> {
    let mut model = ScoringModel::new(config.clone())?;
    let report = model.train(features)?;
    Ok((model, report))
}

/// Score every wallet in `features` with an already fitted model.
pub fn apply(
    model: &ScoringModel,
    features: &[WalletFeatures],
) -> Result<Vec<ScoreRecord>, PipelineError> {
    let scores = model.score(&FeatureTable::from_features(features))?;
    info!(wallets = scores.len(), "scored wallets");
    Ok(scores)
}

/// Distribution and cohort statistics over a scored dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub distribution: ScoreDistribution,
    pub high_scorers: CohortSummary,
    pub low_scorers: CohortSummary,
}

impl ScoreSummary {
    pub fn new(features: &[WalletFeatures], scores: &[ScoreRecord]) -> Self {
        let (high_scorers, low_scorers) = scorer_cohorts(features, scores);
        Self {
            distribution: ScoreDistribution::from_scores(scores),
            high_scorers,
            low_scorers,
        }
    }

    /// Emit the summary as `info` events.
    pub fn log(&self) {
        for (label, count) in ScoreDistribution::bin_labels().iter().zip(self.distribution.bins) {
            info!(range = %label, wallets = count, "score distribution");
        }
        for (category, count) in ScoreCategory::ALL.iter().zip(self.distribution.categories) {
            info!(%category, wallets = count, "score category");
        }
        for (name, cohort) in [("high", &self.high_scorers), ("low", &self.low_scorers)] {
            info!(
                cohort = name,
                wallets = cohort.wallets,
                mean_repay_to_borrow_ratio = ?cohort.mean_repay_to_borrow_ratio,
                mean_days_active = ?cohort.mean_days_active,
                mean_liquidation_rate = ?cohort.mean_liquidation_rate,
                "scorer cohort"
            );
        }
    }
}
