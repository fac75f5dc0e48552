//! # credit-core
//! Foundation types and pure transforms for Credit Ledger.
//!
//! Everything in this crate is deterministic and free of I/O:
//! - **Aggregation**: transactions are grouped per wallet into a fixed-width
//!   [`WalletFeatures`] vector ([`features::aggregate`]).
//! - **Heuristic labels**: an ordered rule table turns a feature vector into a
//!   synthetic training target in `0..=1000` ([`heuristic::label`]).
//! - **Categories**: a monotonic step function buckets scores into
//!   [`ScoreCategory`] labels.
//! - **Summaries**: dataset and score-distribution statistics for reporting.

pub mod category;
pub mod constants;
pub mod error;
pub mod features;
pub mod heuristic;
pub mod summary;
pub mod types;

pub use category::ScoreCategory;
pub use error::{CreditError, FeatureError, ModelError, TransactionError};
pub use features::{aggregate, FeatureTable};
pub use types::{ScoreRecord, Transaction, TransactionType, WalletFeatures};
