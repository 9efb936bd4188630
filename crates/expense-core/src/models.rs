use chrono::{FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ExpenseError, Result};

pub const AMOUNT: &str = "amount";
pub const TIMESTAMP: &str = "timestamp";
pub const CATEGORY: &str = "category";
pub const PROVIDER: &str = "provider";

/// Columns that must be present before normalization is attempted, in the
/// order they are checked.
pub const REQUIRED_COLUMNS: [&str; 3] = [AMOUNT, TIMESTAMP, CATEGORY];

/// Categories classified as recurring fixed spending. Matching is exact and
/// case-sensitive.
pub const FIXED_CATEGORIES: [&str; 4] = ["Rent", "Utilities", "Subscription", "Healthcare"];

/// Columns computed during normalization. A raw column with one of these
/// names is dropped in favour of the derived value.
pub const DERIVED_COLUMNS: [&str; 5] = ["date", "month", "year", "weekday", "fixed_variable"];

/// True for names with a fixed meaning that can never be an extra column.
pub fn is_reserved_column(name: &str) -> bool {
    [AMOUNT, TIMESTAMP, CATEGORY, PROVIDER].contains(&name) || DERIVED_COLUMNS.contains(&name)
}

/// Canonical form of a column header: trimmed and lowercased.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// ── RawTable ──────────────────────────────────────────────────────────────────

/// A loosely-typed table of string cells as read from a file.
///
/// Column names are normalized on construction so `" Amount"` and `"amount"`
/// refer to the same column. Rows shorter than the header read as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new<S: AsRef<str>>(columns: &[S], rows: Vec<Vec<String>>) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|c| normalize_column_name(c.as_ref()))
                .collect(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Position of the first column called `name` (after normalization).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_column_name(name);
        self.columns.iter().position(|c| *c == wanted)
    }

    /// Cell at (`row`, `col`), or `""` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Fail with [`ExpenseError::MissingRequiredColumn`] naming the first
    /// required column that is absent.
    pub fn check_required_columns(&self) -> Result<()> {
        for name in REQUIRED_COLUMNS {
            if self.column_index(name).is_none() {
                return Err(ExpenseError::MissingRequiredColumn(name.to_string()));
            }
        }
        Ok(())
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One typed transaction. Columns the core does not interpret are carried
/// verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub amount: f64,
    pub timestamp: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl TransactionRecord {
    pub fn new(amount: f64, timestamp: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            amount,
            timestamp: timestamp.into(),
            category: category.into(),
            provider: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Recurring-fixed vs discretionary-variable spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpendKind {
    Fixed,
    Variable,
}

impl SpendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpendKind::Fixed => "Fixed",
            SpendKind::Variable => "Variable",
        }
    }
}

impl fmt::Display for SpendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction augmented with calendar fields and its spend kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTransaction {
    #[serde(flatten)]
    pub record: TransactionRecord,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `YYYY-MM`
    pub month: String,
    /// `YYYY`
    pub year: String,
    /// Full English weekday name, e.g. `"Sunday"`.
    pub weekday: String,
    pub fixed_variable: SpendKind,
    /// Wall-clock time parsed from `timestamp`.
    #[serde(skip)]
    pub local_time: NaiveDateTime,
    #[serde(skip)]
    pub utc_offset: Option<FixedOffset>,
}

impl NormalizedTransaction {
    pub fn amount(&self) -> f64 {
        self.record.amount
    }

    /// The point in time `timestamp` names, in UTC. Timestamps without an
    /// offset are read as UTC.
    pub fn instant(&self) -> NaiveDateTime {
        match self.utc_offset {
            Some(offset) => self.local_time - offset,
            None => self.local_time,
        }
    }
}

// ── Fields ────────────────────────────────────────────────────────────────────

/// A categorical column of the normalized table that can be grouped on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Date,
    Month,
    Year,
    Weekday,
    Category,
    FixedVariable,
    Timestamp,
    Provider,
    Extra(String),
}

impl Field {
    pub fn name(&self) -> &str {
        match self {
            Field::Date => "date",
            Field::Month => "month",
            Field::Year => "year",
            Field::Weekday => "weekday",
            Field::Category => CATEGORY,
            Field::FixedVariable => "fixed_variable",
            Field::Timestamp => TIMESTAMP,
            Field::Provider => PROVIDER,
            Field::Extra(name) => name,
        }
    }

    /// The group key of `row` under this field. Absent values read as `""`.
    pub fn value<'a>(&self, row: &'a NormalizedTransaction) -> &'a str {
        match self {
            Field::Date => &row.date,
            Field::Month => &row.month,
            Field::Year => &row.year,
            Field::Weekday => &row.weekday,
            Field::Category => &row.record.category,
            Field::FixedVariable => row.fixed_variable.as_str(),
            Field::Timestamp => &row.record.timestamp,
            Field::Provider => row.record.provider.as_deref().unwrap_or(""),
            Field::Extra(name) => row.record.extra.get(name).map(String::as_str).unwrap_or(""),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which optional columns the source table carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub has_provider: bool,
    pub extra_columns: Vec<String>,
}

impl Schema {
    /// Resolve a column name to a groupable [`Field`].
    ///
    /// `amount` exists but is numeric, so it yields
    /// [`ExpenseError::NotGroupable`]; names that are not columns of the
    /// table yield [`ExpenseError::UnknownField`].
    pub fn resolve(&self, name: &str) -> Result<Field> {
        let key = normalize_column_name(name);
        let field = match key.as_str() {
            AMOUNT => return Err(ExpenseError::NotGroupable(AMOUNT.to_string())),
            "date" => Field::Date,
            "month" => Field::Month,
            "year" => Field::Year,
            "weekday" => Field::Weekday,
            CATEGORY => Field::Category,
            "fixed_variable" => Field::FixedVariable,
            TIMESTAMP => Field::Timestamp,
            PROVIDER if self.has_provider => Field::Provider,
            other if self.extra_columns.iter().any(|c| c == other) => {
                Field::Extra(other.to_string())
            }
            _ => return Err(ExpenseError::UnknownField(name.to_string())),
        };
        Ok(field)
    }

    /// Every field a caller may pick for grouping, excluding the raw
    /// `timestamp` (one group per row is rarely useful).
    pub fn groupable_fields(&self) -> Vec<Field> {
        let mut fields = vec![
            Field::Category,
            Field::FixedVariable,
            Field::Date,
            Field::Month,
            Field::Year,
            Field::Weekday,
        ];
        if self.has_provider {
            fields.push(Field::Provider);
        }
        fields.extend(self.extra_columns.iter().cloned().map(Field::Extra));
        fields
    }
}

// ── NormalizedTable ───────────────────────────────────────────────────────────

/// The output of normalization. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    schema: Schema,
    rows: Vec<NormalizedTransaction>,
}

impl NormalizedTable {
    pub fn new(schema: Schema, rows: Vec<NormalizedTransaction>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[NormalizedTransaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A borrowed view over every row.
    pub fn view(&self) -> TableView<'_> {
        TableView {
            schema: &self.schema,
            rows: self.rows.iter().collect(),
        }
    }

    /// A borrowed view over the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> TableView<'_> {
        TableView {
            schema: &self.schema,
            rows: indices.iter().filter_map(|&i| self.rows.get(i)).collect(),
        }
    }

    /// The largest `month` key present, which is also the most recent one.
    pub fn latest_month(&self) -> Option<&str> {
        self.rows.iter().map(|r| r.month.as_str()).max()
    }
}

/// A read-only subset of a [`NormalizedTable`] that aggregations run over.
#[derive(Debug, Clone)]
pub struct TableView<'a> {
    schema: &'a Schema,
    rows: Vec<&'a NormalizedTransaction>,
}

impl<'a> TableView<'a> {
    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn rows(&self) -> &[&'a NormalizedTransaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Result<Field> {
        self.schema.resolve(name)
    }

    pub fn total_amount(&self) -> f64 {
        self.rows.iter().map(|r| r.amount()).sum()
    }
}
