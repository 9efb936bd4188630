//! Text and JSON rendering of a [`DashboardReport`].

use expense_core::formatting::{
    format_amount, format_fraction, format_optional, format_percent,
};
use expense_data::aggregator::{PivotScale, PivotTable};
use expense_data::analysis::DashboardReport;

use crate::table_view::TextTable;

/// Render every dashboard section as plain-text tables.
pub fn render_report(report: &DashboardReport) -> String {
    let sections = [
        (
            format!("Expense Dashboard (latest month: {})", report.latest_month),
            render_metrics(report),
        ),
        (
            format!("Average Expense by {}", title_case(&report.mean_comparison.field)),
            render_means(report),
        ),
        ("Monthly Expense Trend".to_string(), render_trend(report)),
        ("Category Breakdown".to_string(), render_breakdown(report)),
        (
            format!(
                "Expenses by {} & {}",
                report.pivot.row_field, report.pivot.col_field
            ),
            render_pivot(&report.pivot),
        ),
    ];

    sections
        .iter()
        .map(|(title, body)| format!("{}\n{}\n{}", title, "=".repeat(title.len()), body))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-printed JSON of the whole report. Missing latest-month values are
/// `null`.
pub fn render_json(report: &DashboardReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// ── Sections ──────────────────────────────────────────────────────────────────

fn render_metrics(report: &DashboardReport) -> String {
    let mut table = TextTable::new(&["Total Expense", "Average Expense", "Transactions"]);
    table.push_row(vec![
        format_amount(report.metrics.total),
        format_amount(report.metrics.average),
        report.metrics.count.to_string(),
    ]);
    table.render()
}

fn render_means(report: &DashboardReport) -> String {
    let cmp = &report.mean_comparison;
    let latest_header = format!("Average {}", report.latest_month);
    let mut table = TextTable::new(&[title_case(&cmp.field), "Overall Average".to_string(), latest_header]);
    for (group, mean) in &cmp.overall {
        table.push_row(vec![
            display_group(group),
            format_amount(*mean),
            format_optional(cmp.latest.get(group).copied(), format_amount),
        ]);
    }
    table.render()
}

fn render_trend(report: &DashboardReport) -> String {
    let mut table = TextTable::new(&["Month", "Amount"]);
    for month in &report.monthly_trend {
        table.push_row(vec![display_group(&month.group), format_amount(month.sum)]);
    }
    table.set_totals(vec!["TOTAL".to_string(), format_amount(report.metrics.total)]);
    table.render()
}

fn render_breakdown(report: &DashboardReport) -> String {
    let month = &report.latest_month;
    let mut table = TextTable::new(&[
        "Category".to_string(),
        "Amount".to_string(),
        "% of Total".to_string(),
        format!("Amount {}", month),
        format!("% of Total {}", month),
    ]);
    for row in &report.breakdown {
        table.push_row(vec![
            display_group(&row.group),
            format_amount(row.sum),
            format_percent(row.pct_of_total),
            format_optional(row.latest_sum, format_amount),
            format_optional(row.latest_pct_of_total, format_percent),
        ]);
    }
    table.render()
}

fn render_pivot(pivot: &PivotTable) -> String {
    let cell = |v: f64| match pivot.scale {
        PivotScale::Absolute => format_amount(v),
        PivotScale::Fraction => format_fraction(v),
        PivotScale::Percent => format_percent(v),
    };

    let mut headers = vec![format!("{} \\ {}", pivot.row_field, pivot.col_field)];
    headers.extend(pivot.col_keys.iter().map(|k| display_group(k)));
    headers.push("Total".to_string());

    let mut table = TextTable::new(&headers);
    for (i, key) in pivot.row_keys.iter().enumerate() {
        let mut cells = vec![display_group(key)];
        cells.extend(pivot.cells[i].iter().map(|v| cell(*v)));
        cells.push(cell(pivot.row_total(i)));
        table.push_row(cells);
    }
    table.render()
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Groups built from empty cells have an empty key; show them explicitly.
fn display_group(group: &str) -> String {
    if group.is_empty() {
        "(blank)".to_string()
    } else {
        group.to_string()
    }
}

/// `"fixed_variable"` → `"Fixed Variable"`.
fn title_case(field: &str) -> String {
    field
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
