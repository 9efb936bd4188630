use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Summarise a table of expenses by category, month and any other column
#[derive(Parser, Debug, Clone)]
#[command(
    name = "expense-dashboard",
    about = "Summarise a table of expenses by category, month and any other column",
    version
)]
pub struct Settings {
    /// CSV or JSON file with at least amount, timestamp and category columns
    #[arg(required_unless_present = "sample")]
    pub input: Option<PathBuf>,

    /// Generate N synthetic transactions instead of reading a file
    #[arg(long, value_name = "N", conflicts_with = "input")]
    pub sample: Option<usize>,

    /// Seed for synthetic transactions
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// First day of the synthetic date range
    #[arg(long, default_value = "2025-01-01")]
    pub sample_start: NaiveDate,

    /// Last day of the synthetic date range
    #[arg(long, default_value = "2025-12-31")]
    pub sample_end: NaiveDate,

    /// Field for the overall vs latest-month average comparison
    #[arg(long, default_value = "category")]
    pub group_by: String,

    /// Field for the pivot table rows
    #[arg(long, default_value = "month")]
    pub pivot_rows: String,

    /// Field for the pivot table columns
    #[arg(long, default_value = "category")]
    pub pivot_cols: String,

    /// Show pivot rows as percentages of the row total
    #[arg(long)]
    pub percent: bool,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(
        long,
        env = "EXPENSE_LOG_LEVEL",
        default_value = "WARNING",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"]
    )]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply flag overrides.
    pub fn load() -> Self {
        Self::load_from(std::env::args_os())
    }

    /// Same as [`load`](Self::load) with an explicit argument list.
    pub fn load_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
