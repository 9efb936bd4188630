//! Grouped sums, means, pivots and breakdowns over a normalized table.
//!
//! Every operation takes a [`TableView`] so the same code runs over the full
//! table and over the latest-month view. Operations on an empty view fail
//! with [`ExpenseError::EmptyDataset`] instead of returning zeros or NaN.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use expense_core::models::{Field, TableView};
use expense_core::{ExpenseError, Result};
use serde::Serialize;

// ── Result types ──────────────────────────────────────────────────────────────

/// Output order of [`ExpenseAggregator::grouped_sum`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// Groups in the order their first row appears.
    FirstSeen,
    /// Groups sorted by key, ascending.
    #[default]
    ByKey,
}

/// How pivot cells are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotScale {
    /// Raw sums.
    #[default]
    Absolute,
    /// Each row divided by its total; rows sum to 1.0.
    Fraction,
    /// Same as `Fraction` in points; rows sum to 100.
    Percent,
}

/// Sum of `amount` for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub group: String,
    pub sum: f64,
}

/// One row of a breakdown, sorted by `sum` descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub group: String,
    pub sum: f64,
    /// `100 * sum / total over all groups`.
    pub pct_of_total: f64,
}

/// A full-period breakdown row joined with the same group's latest-month
/// figures. Groups with no latest-month activity carry `None`, not zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownComparison {
    pub group: String,
    pub sum: f64,
    pub pct_of_total: f64,
    pub latest_sum: Option<f64>,
    pub latest_pct_of_total: Option<f64>,
}

/// Headline figures for a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total: f64,
    pub average: f64,
    pub count: usize,
}

/// A cross-tabulation of summed `amount` over two fields.
///
/// Row and column keys are the sorted distinct values observed; combinations
/// with no rows hold `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_field: String,
    pub col_field: String,
    pub scale: PivotScale,
    pub row_keys: Vec<String>,
    pub col_keys: Vec<String>,
    /// `cells[r][c]` for `row_keys[r]` × `col_keys[c]`.
    pub cells: Vec<Vec<f64>>,
}

impl PivotTable {
    /// Cell value for the given keys, `None` if either key is absent.
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.row_keys.iter().position(|k| k == row)?;
        let c = self.col_keys.iter().position(|k| k == col)?;
        Some(self.cells[r][c])
    }

    /// Sum of the cells in row `index`.
    pub fn row_total(&self, index: usize) -> f64 {
        self.cells.get(index).map(|r| r.iter().sum()).unwrap_or(0.0)
    }
}

/// Totals this small relative to the values summed are rounding residue.
const ZERO_TOTAL_TOLERANCE: f64 = 1e-9;

/// `part / total * factor`, or `0` when `total` is zero up to rounding.
/// `magnitude` is the sum of absolute values that produced `total`.
fn share(part: f64, total: f64, magnitude: f64, factor: f64) -> f64 {
    if total.abs() <= magnitude * ZERO_TOTAL_TOLERANCE {
        0.0
    } else {
        part / total * factor
    }
}

// ── GroupStats ────────────────────────────────────────────────────────────────

/// Running sum and count for one group.
#[derive(Debug, Clone, Copy, Default)]
struct GroupStats {
    sum: f64,
    count: usize,
}

impl GroupStats {
    fn add(&mut self, amount: f64) {
        self.sum += amount;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

// ── ExpenseAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that summarises a table view.
pub struct ExpenseAggregator;

impl ExpenseAggregator {
    /// Mean `amount` per distinct value of `field`, keyed by group.
    pub fn grouped_mean(view: &TableView<'_>, field: &str) -> Result<BTreeMap<String, f64>> {
        let field = Self::prepare(view, field)?;
        let groups = Self::accumulate(view, &field);
        Ok(groups
            .into_iter()
            .map(|(key, stats)| (key.to_string(), stats.mean()))
            .collect())
    }

    /// Sum of `amount` per distinct value of `field`.
    ///
    /// The group sums always add up to the view's total.
    pub fn grouped_sum(
        view: &TableView<'_>,
        field: &str,
        order: GroupOrder,
    ) -> Result<Vec<GroupTotal>> {
        let field = Self::prepare(view, field)?;
        let totals = match order {
            GroupOrder::ByKey => Self::accumulate(view, &field)
                .into_iter()
                .map(|(key, stats)| GroupTotal {
                    group: key.to_string(),
                    sum: stats.sum,
                })
                .collect(),
            GroupOrder::FirstSeen => {
                let mut totals: Vec<GroupTotal> = Vec::new();
                let mut index: HashMap<&str, usize> = HashMap::new();
                for row in view.rows() {
                    let key = field.value(row);
                    let slot = *index.entry(key).or_insert_with(|| {
                        totals.push(GroupTotal {
                            group: key.to_string(),
                            sum: 0.0,
                        });
                        totals.len() - 1
                    });
                    totals[slot].sum += row.amount();
                }
                totals
            }
        };
        Ok(totals)
    }

    /// Cross-tabulate summed `amount` by `row_field` × `col_field`.
    ///
    /// With a relative `scale`, each row is divided by its own total. A row
    /// whose total is zero, up to rounding, stays all-zero.
    pub fn pivot(
        view: &TableView<'_>,
        row_field: &str,
        col_field: &str,
        scale: PivotScale,
    ) -> Result<PivotTable> {
        let rf = Self::prepare(view, row_field)?;
        let cf = Self::prepare(view, col_field)?;

        let mut sums: HashMap<(&str, &str), f64> = HashMap::new();
        let mut row_set: BTreeSet<&str> = BTreeSet::new();
        let mut col_set: BTreeSet<&str> = BTreeSet::new();
        for row in view.rows() {
            let (r, c) = (rf.value(row), cf.value(row));
            row_set.insert(r);
            col_set.insert(c);
            *sums.entry((r, c)).or_insert(0.0) += row.amount();
        }

        let mut cells: Vec<Vec<f64>> = row_set
            .iter()
            .map(|r| {
                col_set
                    .iter()
                    .map(|c| sums.get(&(*r, *c)).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        let factor = match scale {
            PivotScale::Absolute => None,
            PivotScale::Fraction => Some(1.0),
            PivotScale::Percent => Some(100.0),
        };
        if let Some(factor) = factor {
            for row in cells.iter_mut() {
                let total: f64 = row.iter().sum();
                let magnitude: f64 = row.iter().map(|c| c.abs()).sum();
                for cell in row.iter_mut() {
                    *cell = share(*cell, total, magnitude, factor);
                }
            }
        }

        Ok(PivotTable {
            row_field: rf.name().to_string(),
            col_field: cf.name().to_string(),
            scale,
            row_keys: row_set.into_iter().map(str::to_string).collect(),
            col_keys: col_set.into_iter().map(str::to_string).collect(),
            cells,
        })
    }

    /// Group sums with their share of the total, largest first.
    ///
    /// Ties are broken by group name. When the total is zero, up to rounding,
    /// every share is reported as `0`.
    pub fn breakdown(view: &TableView<'_>, field: &str) -> Result<Vec<BreakdownRow>> {
        let sums = Self::grouped_sum(view, field, GroupOrder::ByKey)?;
        let total: f64 = sums.iter().map(|g| g.sum).sum();
        let magnitude: f64 = sums.iter().map(|g| g.sum.abs()).sum();

        let mut rows: Vec<BreakdownRow> = sums
            .into_iter()
            .map(|g| BreakdownRow {
                pct_of_total: share(g.sum, total, magnitude, 100.0),
                group: g.group,
                sum: g.sum,
            })
            .collect();
        rows.sort_by(|a, b| b.sum.total_cmp(&a.sum).then_with(|| a.group.cmp(&b.group)));
        Ok(rows)
    }

    /// [`breakdown`](Self::breakdown) by `category`.
    pub fn category_breakdown(view: &TableView<'_>) -> Result<Vec<BreakdownRow>> {
        Self::breakdown(view, expense_core::models::CATEGORY)
    }

    /// Left-join `latest` onto `full` by group, keeping `full`'s order.
    pub fn compare_breakdowns(
        full: &[BreakdownRow],
        latest: &[BreakdownRow],
    ) -> Vec<BreakdownComparison> {
        let by_group: HashMap<&str, &BreakdownRow> =
            latest.iter().map(|r| (r.group.as_str(), r)).collect();

        full.iter()
            .map(|row| {
                let hit = by_group.get(row.group.as_str());
                BreakdownComparison {
                    group: row.group.clone(),
                    sum: row.sum,
                    pct_of_total: row.pct_of_total,
                    latest_sum: hit.map(|l| l.sum),
                    latest_pct_of_total: hit.map(|l| l.pct_of_total),
                }
            })
            .collect()
    }

    /// Total, mean and count of `amount`.
    pub fn summary_metrics(view: &TableView<'_>) -> Result<SummaryMetrics> {
        if view.is_empty() {
            return Err(ExpenseError::EmptyDataset);
        }
        let total = view.total_amount();
        Ok(SummaryMetrics {
            total,
            average: total / view.len() as f64,
            count: view.len(),
        })
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Reject empty views, then resolve `name` against the view's schema.
    fn prepare(view: &TableView<'_>, name: &str) -> Result<Field> {
        if view.is_empty() {
            return Err(ExpenseError::EmptyDataset);
        }
        view.resolve(name)
    }

    /// Sum and count per group, keys sorted.
    fn accumulate<'a>(view: &TableView<'a>, field: &Field) -> BTreeMap<&'a str, GroupStats> {
        let mut map: BTreeMap<&'a str, GroupStats> = BTreeMap::new();
        for &row in view.rows() {
            map.entry(field.value(row)).or_default().add(row.amount());
        }
        map
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
