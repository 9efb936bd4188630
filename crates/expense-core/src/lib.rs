//! Core types for the expense dashboard.
//!
//! Holds the transaction data model, timestamp parsing, the normalizer that
//! derives calendar fields and the fixed/variable classification, the shared
//! error type, display formatting and command-line settings.

pub mod error;
pub mod formatting;
pub mod models;
pub mod normalizer;
pub mod settings;
pub mod time_utils;

pub use error::{ExpenseError, Result};
pub use normalizer::{classify, normalize, normalize_records};
