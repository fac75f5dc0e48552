//! Pipeline configuration.
//!
//! Layers, lowest precedence first: built-in defaults, an optional TOML file,
//! then command-line overrides applied with [`PipelineConfig::apply`].
//!
//! ```toml
//! [model]
//! n_estimators = 200
//! seed = 7
//!
//! [report]
//! format = "jsonl"
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use config::{Config, ConfigError, File, FileFormat};
use credit_model::ModelConfig;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Output encoding of the score report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Jsonl,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" | "json-lines" | "ndjson" => Ok(Self::Jsonl),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: ModelConfig,
    pub report: ReportConfig,
}

/// Values given on the command line. `None` keeps the layered value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub trees: Option<usize>,
    pub max_depth: Option<usize>,
    pub seed: Option<u64>,
    pub format: Option<ReportFormat>,
}

impl PipelineConfig {
    /// Defaults, overlaid with `path` when given. The file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder().add_source(Config::try_from(&PipelineConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let cfg: PipelineConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply command-line overrides and re-validate.
    pub fn apply(mut self, overrides: &ConfigOverrides) -> Result<Self, PipelineError> {
        if let Some(trees) = overrides.trees {
            self.model.n_estimators = trees;
        }
        if let Some(depth) = overrides.max_depth {
            self.model.max_depth = depth;
        }
        if let Some(seed) = overrides.seed {
            self.model.seed = seed;
        }
        if let Some(format) = overrides.format {
            self.report.format = format;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.model
            .validate()
            .map_err(|e| PipelineError::Config(ConfigError::Message(e.to_string())))
    }
}
