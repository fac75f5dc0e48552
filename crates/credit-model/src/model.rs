//! The scoring model: fit on heuristic labels, apply to any feature table.
//!
//! Training and prediction are separate phases. A [`ScoringModel`] starts
//! untrained; [`ScoringModel::train`] (or [`ScoringModel::load`]) installs a
//! fitted (forest, scaler, columns) triple that prediction reads but never
//! changes.

use std::path::Path;

use credit_core::constants::{SCORE_MAX, SCORE_MIN};
use credit_core::error::{FeatureError, ModelError};
use credit_core::heuristic;
use credit_core::{FeatureTable, ScoreRecord, WalletFeatures};
use tracing::info;

use crate::artifact;
use crate::config::ModelConfig;
use crate::forest::RandomForest;
use crate::metrics;
use crate::scaler::StandardScaler;
use crate::split::train_eval_split;

/// Fitted parameters. Applied with exactly the column order it was fitted on.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub struct FittedModel {
    pub columns: Vec<String>,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
}

impl FittedModel {
    /// Consistency between the three parts, checked after loading.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.columns.is_empty() {
            return Err("no predictor columns".into());
        }
        self.scaler.validate(self.columns.len())?;
        self.forest.validate(self.columns.len())
    }
}

/// Held-out quality of a training run. Informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub eval_rows: usize,
    pub trees: usize,
    /// `None` when the evaluation split is empty.
    pub rmse: Option<f64>,
    /// `None` when the evaluation split is empty.
    pub r2: Option<f64>,
}

pub struct ScoringModel {
    config: ModelConfig,
    fitted: Option<FittedModel>,
}

impl ScoringModel {
    /// Create an untrained model. Fails on an invalid configuration.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        Ok(Self {
            config,
            fitted: None,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    /// Predictor columns in fit order, once trained.
    pub fn feature_columns(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.columns.as_slice())
    }

    /// Train on aggregated wallets, using heuristic labels as targets and
    /// every feature column as a predictor.
    pub fn train(&mut self, features: &[WalletFeatures]) -> Result<TrainingReport, ModelError> {
        let table = FeatureTable::from_features(features);
        let targets = heuristic::labels(features);
        self.train_table(&table, &targets)
    }

    /// Train on an arbitrary table: all of its columns become predictors.
    ///
    /// The scaler is fitted on the training half only; the evaluation half is
    /// scored for [`TrainingReport`] and otherwise unused. Replaces any
    /// previously fitted state.
    pub fn train_table(
        &mut self,
        table: &FeatureTable,
        targets: &[f64],
    ) -> Result<TrainingReport, ModelError> {
        if table.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if targets.len() != table.len() {
            return Err(ModelError::TargetMismatch {
                rows: table.len(),
                targets: targets.len(),
            });
        }
        if table.columns().is_empty() {
            return Err(ModelError::InvalidConfig("table has no predictor columns".into()));
        }

        let split = train_eval_split(table.len(), self.config.test_fraction, self.config.seed);
        let rows = table.rows();
        let train_x: Vec<Vec<f64>> = split.train.iter().map(|&i| rows[i].clone()).collect();
        let train_y: Vec<f64> = split.train.iter().map(|&i| targets[i]).collect();
        let eval_x: Vec<Vec<f64>> = split.eval.iter().map(|&i| rows[i].clone()).collect();
        let eval_y: Vec<f64> = split.eval.iter().map(|&i| targets[i]).collect();

        let scaler = StandardScaler::fit(&train_x)?;
        let forest = RandomForest::fit(&scaler.transform(&train_x), &train_y, &self.config);

        let eval_pred: Vec<f64> = forest
            .predict(&scaler.transform(&eval_x))
            .into_iter()
            .map(clamp_score)
            .collect();
        let report = TrainingReport {
            train_rows: train_x.len(),
            eval_rows: eval_x.len(),
            trees: forest.len(),
            rmse: metrics::rmse(&eval_y, &eval_pred),
            r2: metrics::r2(&eval_y, &eval_pred),
        };

        info!(
            train_rows = report.train_rows,
            eval_rows = report.eval_rows,
            trees = report.trees,
            rmse = ?report.rmse,
            r2 = ?report.r2,
            "trained scoring model"
        );

        self.fitted = Some(FittedModel {
            columns: table.columns().to_vec(),
            scaler,
            forest,
        });
        Ok(report)
    }

    /// Scores in `0.0..=1000.0`, one per table row.
    ///
    /// The table must contain every predictor column seen at fit time; extra
    /// columns are ignored and order does not matter.
    pub fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotTrained)?;
        let x = table.select(&fitted.columns).map_err(|e| match e {
            FeatureError::MissingColumns(cols) => ModelError::MissingColumns(cols),
            other => ModelError::InvalidConfig(other.to_string()),
        })?;
        Ok(fitted
            .forest
            .predict(&fitted.scaler.transform(&x))
            .into_iter()
            .map(clamp_score)
            .collect())
    }

    /// Predict over aggregated wallets.
    pub fn predict_wallets(&self, features: &[WalletFeatures]) -> Result<Vec<f64>, ModelError> {
        self.predict(&FeatureTable::from_features(features))
    }

    /// Predict and turn each row into a rounded, categorised [`ScoreRecord`].
    pub fn score(&self, table: &FeatureTable) -> Result<Vec<ScoreRecord>, ModelError> {
        let preds = self.predict(table)?;
        Ok(table
            .wallets()
            .iter()
            .zip(preds)
            .map(|(w, p)| ScoreRecord::from_prediction(w.clone(), p))
            .collect())
    }

    /// Persist the fitted model atomically.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotTrained)?;
        artifact::save(path, &self.config, fitted)?;
        info!(path = %path.display(), "saved scoring model");
        Ok(())
    }

    /// Load a model saved by [`ScoringModel::save`].
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let (config, fitted) = artifact::load(path)?;
        info!(
            path = %path.display(),
            columns = fitted.columns.len(),
            trees = fitted.forest.len(),
            "loaded scoring model"
        );
        Ok(Self {
            config,
            fitted: Some(fitted),
        })
    }
}

impl std::fmt::Debug for ScoringModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringModel")
            .field("config", &self.config)
            .field("trained", &self.is_trained())
            .field("columns", &self.feature_columns().map_or(0, |c| c.len()))
            .finish()
    }
}

fn clamp_score(p: f64) -> f64 {
    p.clamp(SCORE_MIN as f64, SCORE_MAX as f64)
}
