use anyhow::Context;
use expense_core::models::RawTable;
use expense_core::settings::Settings;
use expense_data::analysis::ReportOptions;
use expense_data::aggregator::PivotScale;
use expense_data::reader::load_table;
use expense_data::sample::{generate_transactions, SampleConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a Python-style level name to a `tracing` filter directive.
///
/// Unrecognised names pass through unchanged so that full `EnvFilter`
/// directives such as `expense_data=debug` also work.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr so that
/// report output on stdout stays clean.
///
/// Falls back to `"info"` if the level cannot be parsed as a filter.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}

// ── Input and options ──────────────────────────────────────────────────────────

/// Load the input file, or generate a sample when `--sample` is set.
pub fn load_input(settings: &Settings) -> anyhow::Result<RawTable> {
    if let Some(count) = settings.sample {
        let config = SampleConfig {
            count,
            start: settings.sample_start,
            end: settings.sample_end,
            seed: settings.seed,
        };
        tracing::info!(
            "Generating {} sample transactions (seed {})",
            count,
            settings.seed
        );
        return generate_transactions(&config).context("generating sample transactions");
    }

    let path = settings
        .input
        .as_ref()
        .context("an input file or --sample is required")?;
    load_table(path).with_context(|| format!("loading {}", path.display()))
}

/// Translate CLI settings into report options.
pub fn report_options(settings: &Settings) -> ReportOptions {
    ReportOptions {
        group_by: settings.group_by.clone(),
        pivot_rows: settings.pivot_rows.clone(),
        pivot_cols: settings.pivot_cols.clone(),
        pivot_scale: if settings.percent {
            PivotScale::Percent
        } else {
            PivotScale::Absolute
        },
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
