mod bootstrap;

use anyhow::{Context, Result};
use expense_core::settings::Settings;
use expense_data::analysis::ExpenseAnalysis;
use expense_ui::report_view::{render_json, render_report};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Expense Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Group by: {}, pivot: {} x {}, percent: {}",
        settings.group_by,
        settings.pivot_rows,
        settings.pivot_cols,
        settings.percent
    );

    let raw = bootstrap::load_input(&settings)?;
    let analysis = ExpenseAnalysis::from_raw(&raw).context("normalizing transactions")?;

    let fields: Vec<String> = analysis
        .groupable_fields()
        .iter()
        .map(|f| f.to_string())
        .collect();
    tracing::debug!("Groupable fields: {}", fields.join(", "));

    let report = analysis
        .report(&bootstrap::report_options(&settings))
        .context("computing dashboard")?;

    if settings.wants_json() {
        println!("{}", render_json(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    Ok(())
}
