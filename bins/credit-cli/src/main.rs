//! credit-cli — Batch credit scoring for lending-protocol transaction logs.
//!
//! Loads a JSON transaction log, aggregates it per wallet, fits (or loads) a
//! scoring model and writes a per-wallet score report.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use credit_core::summary::TransactionSummary;
use credit_core::TransactionType;
use credit_model::ScoringModel;
use credit_pipeline::ingest::load_transactions;
use credit_pipeline::report::{assemble, write_report_file};
use credit_pipeline::{
    apply, fit, ConfigOverrides, Dataset, PipelineConfig, ReportFormat, ScoreSummary,
};
use tracing::info;

/// Credit Ledger command-line interface.
#[derive(Parser)]
#[command(name = "credit-cli")]
#[command(version, about = "Per-wallet credit scores from lending-protocol transaction logs")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a model on a dataset and score the same dataset.
    Run(RunArgs),
    /// Fit a model, save it, and report on the training dataset.
    Train(TrainArgs),
    /// Score a dataset with a saved model.
    Score(ScoreArgs),
    /// Print a summary of a transaction log.
    Summary(SummaryArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of trees in the ensemble.
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Seed for the split and the ensemble.
    #[arg(long)]
    seed: Option<u64>,

    /// Report format (csv or jsonl).
    #[arg(long)]
    format: Option<ReportFormat>,
}

impl ConfigArgs {
    fn load(&self) -> Result<PipelineConfig> {
        let overrides = ConfigOverrides {
            trees: self.trees,
            max_depth: self.max_depth,
            seed: self.seed,
            format: self.format,
        };
        PipelineConfig::load(self.config.as_deref())
            .and_then(|c| c.apply(&overrides))
            .context("Invalid configuration")
    }
}

#[derive(Args)]
struct RunArgs {
    /// JSON transaction log.
    input: PathBuf,

    /// Report path.
    #[arg(short, long, default_value = "credit_scores.csv")]
    output: PathBuf,

    /// Also save the fitted model here.
    #[arg(short, long)]
    model: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args)]
struct TrainArgs {
    /// JSON transaction log.
    input: PathBuf,

    /// Where to save the fitted model.
    #[arg(short, long)]
    model: PathBuf,

    /// Report path for the training dataset.
    #[arg(short, long, default_value = "credit_scores.csv")]
    output: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Args)]
struct ScoreArgs {
    /// JSON transaction log.
    input: PathBuf,

    /// Saved model to score with.
    #[arg(short, long)]
    model: PathBuf,

    /// Report path.
    #[arg(short, long, default_value = "credit_scores.csv")]
    output: PathBuf,

    /// TOML configuration file. Only the `[report]` table applies; model
    /// settings come from the saved model.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report format (csv or jsonl).
    #[arg(long)]
    format: Option<ReportFormat>,
}

#[derive(Args)]
struct SummaryArgs {
    /// JSON transaction log.
    input: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    info!("Credit Ledger v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Train(args) => train(args),
        Commands::Score(args) => score(args),
        Commands::Summary(args) => summary(args),
    }
}

/// Fit and apply on one dataset.
fn run(args: RunArgs) -> Result<()> {
    let config = args.config.load()?;
    let dataset = load_dataset(&args.input)?;

    let (model, _) = fit(&dataset.features, &config.model).context("Failed to train model")?;
    if let Some(path) = &args.model {
        save_model(&model, path)?;
    }
    score_and_write(&model, &dataset, config.report.format, &args.output)
}

/// Fit, save, and report on the training data.
fn train(args: TrainArgs) -> Result<()> {
    let config = args.config.load()?;
    let dataset = load_dataset(&args.input)?;

    let (model, _) = fit(&dataset.features, &config.model).context("Failed to train model")?;
    save_model(&model, &args.model)?;
    score_and_write(&model, &dataset, config.report.format, &args.output)
}

/// Apply a saved model to a new dataset.
fn score(args: ScoreArgs) -> Result<()> {
    let overrides = ConfigOverrides {
        format: args.format,
        ..Default::default()
    };
    let config = PipelineConfig::load(args.config.as_deref())
        .and_then(|c| c.apply(&overrides))
        .context("Invalid configuration")?;
    let model = ScoringModel::load(&args.model)
        .with_context(|| format!("Failed to load model: {}", args.model.display()))?;
    let dataset = load_dataset(&args.input)?;
    score_and_write(&model, &dataset, config.report.format, &args.output)
}

fn summary(args: SummaryArgs) -> Result<()> {
    let s = summarize(&args.input)?;

    info!(
        total_transactions = s.total_transactions,
        unique_wallets = s.unique_wallets,
        first = ?s.first_timestamp,
        last = ?s.last_timestamp,
        "transaction summary"
    );
    for kind in TransactionType::ALL {
        info!(%kind, count = s.count(kind), "transaction type");
    }
    Ok(())
}

/// Summarise a log without aggregating it, so an empty log is not an error.
fn summarize(path: &Path) -> Result<TransactionSummary> {
    let (transactions, stats) = load_transactions(path)
        .with_context(|| format!("Failed to load transactions: {}", path.display()))?;
    info!(
        records = stats.records,
        kept = stats.kept,
        dropped = stats.dropped(),
        "transactions ready"
    );
    Ok(TransactionSummary::from_transactions(&transactions))
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let dataset = Dataset::load(path)
        .with_context(|| format!("Failed to load transactions: {}", path.display()))?;
    info!(
        records = dataset.stats.records,
        kept = dataset.stats.kept,
        dropped = dataset.stats.dropped(),
        wallets = dataset.features.len(),
        "dataset ready"
    );
    Ok(dataset)
}

fn save_model(model: &ScoringModel, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    model
        .save(path)
        .with_context(|| format!("Failed to save model: {}", path.display()))
}

fn score_and_write(
    model: &ScoringModel,
    dataset: &Dataset,
    format: ReportFormat,
    output: &Path,
) -> Result<()> {
    let scores = apply(model, &dataset.features).context("Failed to score wallets")?;
    ScoreSummary::new(&dataset.features, &scores).log();

    let rows = assemble(&dataset.features, &scores)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    write_report_file(&rows, format, output)
        .with_context(|| format!("Failed to write report: {}", output.display()))?;
    info!("credit scores generated for {} wallets", rows.len());
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Pass `format = "json"` for structured JSON output. Any other value
/// defaults to human-readable text. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["credit-cli", "run", "tx.json"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.output, PathBuf::from("credit_scores.csv"));
        assert!(args.model.is_none());
        assert!(args.config.trees.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn overrides_parse() {
        let cli = Cli::try_parse_from([
            "credit-cli",
            "run",
            "tx.json",
            "--trees",
            "7",
            "--format",
            "jsonl",
            "--log-format",
            "json",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.trees, Some(7));
        assert_eq!(args.config.format, Some(ReportFormat::Jsonl));
        assert_eq!(cli.log_format, "json");
    }

    #[test]
    fn score_takes_report_options_only() {
        let cli = Cli::try_parse_from([
            "credit-cli", "score", "tx.json", "--model", "m.bin", "--format", "jsonl", "-c", "c.toml",
        ])
        .unwrap();
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.format, Some(ReportFormat::Jsonl));
        assert_eq!(args.config, Some(PathBuf::from("c.toml")));

        for flag in ["--trees", "--max-depth", "--seed"] {
            let res = Cli::try_parse_from(["credit-cli", "score", "tx.json", "--model", "m.bin", flag, "3"]);
            assert!(res.is_err(), "{flag} should be rejected");
        }
    }

    #[test]
    fn summary_accepts_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, "[]").unwrap();

        let s = summarize(&path).unwrap();
        assert_eq!(s.total_transactions, 0);
        assert_eq!(s.unique_wallets, 0);
        assert!(s.first_timestamp.is_none());
        assert!(summary(SummaryArgs { input: path }).is_ok());
    }

    #[test]
    fn train_requires_model_path() {
        assert!(Cli::try_parse_from(["credit-cli", "train", "tx.json"]).is_err());
    }
}
