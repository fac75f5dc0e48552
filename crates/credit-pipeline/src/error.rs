//! Error type for the pipeline crate.
use credit_core::error::{FeatureError, ModelError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")] Io(#[from] std::io::Error),
    #[error("parse error: {0}")] Parse(String),
    #[error("config error: {0}")] Config(#[from] config::ConfigError),
    #[error("no score for wallet {0}")] MissingScore(String),
    #[error(transparent)] Feature(#[from] FeatureError),
    #[error(transparent)] Model(#[from] ModelError),
}
