//! The per-session analysis value and the dashboard report built from it.
//!
//! [`ExpenseAnalysis`] owns the normalized table and remembers which rows
//! form the latest-month view. It is built once and only read afterwards,
//! so it can be shared freely between callers.

use std::collections::BTreeMap;

use expense_core::models::{Field, NormalizedTable, RawTable, TableView};
use expense_core::{normalize, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregator::{
    BreakdownComparison, ExpenseAggregator, GroupOrder, GroupTotal, PivotScale, PivotTable,
    SummaryMetrics,
};

// ── ExpenseAnalysis ───────────────────────────────────────────────────────────

/// A normalized table plus its derived latest-month view.
#[derive(Debug, Clone)]
pub struct ExpenseAnalysis {
    table: NormalizedTable,
    latest_month: Option<String>,
    latest_rows: Vec<usize>,
}

impl ExpenseAnalysis {
    /// Wrap an already-normalized table.
    pub fn new(table: NormalizedTable) -> Self {
        let latest_month = table.latest_month().map(str::to_string);
        let latest_rows: Vec<usize> = match &latest_month {
            Some(month) => table
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| row.month == *month)
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        };

        debug!(
            "Latest month {:?} holds {} of {} rows",
            latest_month,
            latest_rows.len(),
            table.len()
        );

        Self {
            table,
            latest_month,
            latest_rows,
        }
    }

    /// Normalize `raw` and wrap the result.
    pub fn from_raw(raw: &RawTable) -> Result<Self> {
        let table = normalize(raw)?;
        info!("Normalized {} transactions", table.len());
        Ok(Self::new(table))
    }

    pub fn table(&self) -> &NormalizedTable {
        &self.table
    }

    /// Every row.
    pub fn full(&self) -> TableView<'_> {
        self.table.view()
    }

    /// Rows whose month is the most recent month in the table.
    pub fn latest(&self) -> TableView<'_> {
        self.table.select(&self.latest_rows)
    }

    /// The most recent `YYYY-MM` key, `None` for an empty table.
    pub fn latest_month(&self) -> Option<&str> {
        self.latest_month.as_deref()
    }

    /// Fields a caller may group or pivot on.
    pub fn groupable_fields(&self) -> Vec<Field> {
        self.table.schema().groupable_fields()
    }

    /// Compute every dashboard section.
    pub fn report(&self, options: &ReportOptions) -> Result<DashboardReport> {
        let full = self.full();
        let latest = self.latest();

        let metrics = ExpenseAggregator::summary_metrics(&full)?;
        let mean_comparison = MeanComparison {
            field: options.group_by.clone(),
            overall: ExpenseAggregator::grouped_mean(&full, &options.group_by)?,
            latest: ExpenseAggregator::grouped_mean(&latest, &options.group_by)?,
        };
        let monthly_trend = ExpenseAggregator::grouped_sum(&full, "month", GroupOrder::ByKey)?;
        let breakdown = ExpenseAggregator::compare_breakdowns(
            &ExpenseAggregator::category_breakdown(&full)?,
            &ExpenseAggregator::category_breakdown(&latest)?,
        );
        let pivot = ExpenseAggregator::pivot(
            &full,
            &options.pivot_rows,
            &options.pivot_cols,
            options.pivot_scale,
        )?;

        Ok(DashboardReport {
            latest_month: self.latest_month.clone().unwrap_or_default(),
            metrics,
            mean_comparison,
            monthly_trend,
            breakdown,
            pivot,
        })
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Which fields the configurable dashboard sections use.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Field for the overall vs latest-month mean comparison.
    pub group_by: String,
    pub pivot_rows: String,
    pub pivot_cols: String,
    pub pivot_scale: PivotScale,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            group_by: "category".to_string(),
            pivot_rows: "month".to_string(),
            pivot_cols: "category".to_string(),
            pivot_scale: PivotScale::Absolute,
        }
    }
}

/// Mean amount per group over the whole table and over the latest month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanComparison {
    pub field: String,
    pub overall: BTreeMap<String, f64>,
    pub latest: BTreeMap<String, f64>,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub latest_month: String,
    pub metrics: SummaryMetrics,
    pub mean_comparison: MeanComparison,
    pub monthly_trend: Vec<GroupTotal>,
    pub breakdown: Vec<BreakdownComparison>,
    pub pivot: PivotTable,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
