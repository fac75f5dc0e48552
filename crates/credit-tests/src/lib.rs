//! Integration test suite for Credit Ledger.
//!
//! Exercises the full ingest → aggregate → fit → apply → report path, model
//! persistence, determinism, and score bounds under adversarial inputs.

pub mod helpers;
