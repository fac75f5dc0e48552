//! Error types for Credit Ledger.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    #[error("empty wallet address")] EmptyWallet,
    #[error("unknown transaction type: {0}")] UnknownType(String),
    #[error("amount must be positive and finite: {0}")] InvalidAmount(f64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("no wallets: transaction set is empty")] NoWallets,
    #[error("missing columns: {}", .0.join(", "))] MissingColumns(Vec<String>),
    #[error("duplicate column: {0}")] DuplicateColumn(String),
    #[error("row {row} has {got} values, expected {expected}")] RowWidth { row: usize, expected: usize, got: usize },
    #[error("{wallets} wallet ids for {rows} rows")] WalletCount { wallets: usize, rows: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("model has not been trained")] NotTrained,
    #[error("empty training set")] EmptyTrainingSet,
    #[error("{targets} targets for {rows} rows")] TargetMismatch { rows: usize, targets: usize },
    #[error("invalid model config: {0}")] InvalidConfig(String),
    #[error("missing predictor columns: {}", .0.join(", "))] MissingColumns(Vec<String>),
    #[error("serialization: {0}")] Serialization(String),
    #[error("deserialization: {0}")] Deserialization(String),
    #[error("I/O error: {0}")] Io(String),
}

#[derive(Error, Debug)]
pub enum CreditError {
    #[error(transparent)] Transaction(#[from] TransactionError),
    #[error(transparent)] Feature(#[from] FeatureError),
    #[error(transparent)] Model(#[from] ModelError),
}
