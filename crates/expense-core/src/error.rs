use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the expense dashboard crates.
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// One of `amount`, `timestamp` or `category` is absent from the input.
    #[error("Missing required column: {0}")]
    MissingRequiredColumn(String),

    /// A `timestamp` cell could not be parsed. `row` is 0-based.
    #[error("Malformed timestamp at row {row}: {value:?}")]
    MalformedTimestamp { row: usize, value: String },

    /// An `amount` cell is not a number. `row` is 0-based.
    #[error("Invalid amount at row {row}: {value:?}")]
    InvalidAmount { row: usize, value: String },

    /// An aggregation was requested over a table with no rows.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// A group or pivot field does not exist in the normalized table.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The field exists but holds numeric values that cannot be grouped on.
    #[error("Field cannot be used for grouping: {0}")]
    NotGroupable(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A JSON document parsed but does not describe a table.
    #[error("JSON input is not a table: {0}")]
    InvalidJsonTable(String),

    /// The input file extension is not one of the supported formats.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Synthetic sample parameters are out of range.
    #[error("Invalid sample configuration: {0}")]
    InvalidSample(String),
}

/// Convenience alias used throughout the expense crates.
pub type Result<T> = std::result::Result<T, ExpenseError>;
