//! # credit-pipeline — Batch scoring pipeline for Credit Ledger.
//!
//! Thin collaborators around the core:
//! - **Ingest**: JSON transaction log → cleaned [`credit_core::Transaction`]s.
//! - **Config**: layered [`PipelineConfig`] (defaults, TOML file, overrides).
//! - **Pipeline**: explicit [`pipeline::fit`] and [`pipeline::apply`] phases.
//! - **Report**: scores joined with features, written as CSV or JSON lines.

pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod report;

pub use config::{ConfigOverrides, PipelineConfig, ReportFormat};
pub use error::PipelineError;
pub use ingest::IngestStats;
pub use pipeline::{apply, fit, Dataset, ScoreSummary};
