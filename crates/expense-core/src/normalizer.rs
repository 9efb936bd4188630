//! Turns a raw table into a [`NormalizedTable`].
//!
//! Normalization is all-or-nothing: the first bad row fails the whole call
//! and no partial table is returned. The input is never modified.

use std::collections::BTreeMap;

use chrono::FixedOffset;

use crate::error::{ExpenseError, Result};
use crate::models::{
    is_reserved_column, NormalizedTable, NormalizedTransaction, RawTable, Schema, SpendKind,
    TransactionRecord, AMOUNT, CATEGORY, FIXED_CATEGORIES, PROVIDER, TIMESTAMP,
};
use crate::time_utils::{parse_timestamp, ParsedTimestamp};

/// Classify a category as fixed or variable spending (exact, case-sensitive).
pub fn classify(category: &str) -> SpendKind {
    if FIXED_CATEGORIES.contains(&category) {
        SpendKind::Fixed
    } else {
        SpendKind::Variable
    }
}

/// Validate required columns, type every row and derive calendar fields.
pub fn normalize(raw: &RawTable) -> Result<NormalizedTable> {
    raw.check_required_columns()?;
    let schema = schema_of(raw);
    let records = typed_records(raw, &schema)?;
    let rows = derive_all(records)?;
    Ok(NormalizedTable::new(schema, rows))
}

/// Normalize records that are already typed.
///
/// The schema is inferred from the records: `provider` counts as a column
/// if any record has one, and extra columns are the union of all keys.
/// Extra keys that collide with a built-in or derived column are dropped.
pub fn normalize_records(records: &[TransactionRecord]) -> Result<NormalizedTable> {
    let has_provider = records.iter().any(|r| r.provider.is_some());
    let mut extra_columns: Vec<String> = Vec::new();
    let mut owned: Vec<TransactionRecord> = Vec::with_capacity(records.len());
    for record in records {
        let mut record = record.clone();
        record.extra.retain(|key, _| !is_reserved_column(key));
        for key in record.extra.keys() {
            if !extra_columns.contains(key) {
                extra_columns.push(key.clone());
            }
        }
        owned.push(record);
    }
    let schema = Schema {
        has_provider,
        extra_columns,
    };
    let rows = derive_all(owned)?;
    Ok(NormalizedTable::new(schema, rows))
}

// ── Private ───────────────────────────────────────────────────────────────────

fn schema_of(raw: &RawTable) -> Schema {
    let mut extra_columns: Vec<String> = Vec::new();
    for column in raw.columns() {
        if !is_reserved_column(column) && !column.is_empty() && !extra_columns.contains(column) {
            extra_columns.push(column.clone());
        }
    }
    Schema {
        has_provider: raw.column_index(PROVIDER).is_some(),
        extra_columns,
    }
}

fn typed_records(raw: &RawTable, schema: &Schema) -> Result<Vec<TransactionRecord>> {
    // check_required_columns has already run, so these lookups succeed.
    let col = |name: &str| {
        raw.column_index(name)
            .ok_or_else(|| ExpenseError::MissingRequiredColumn(name.to_string()))
    };
    let amount_col = col(AMOUNT)?;
    let timestamp_col = col(TIMESTAMP)?;
    let category_col = col(CATEGORY)?;
    let provider_col = raw.column_index(PROVIDER);
    let extra_cols: Vec<(&String, usize)> = schema
        .extra_columns
        .iter()
        .filter_map(|name| raw.column_index(name).map(|i| (name, i)))
        .collect();

    let mut records = Vec::with_capacity(raw.len());
    for row in 0..raw.len() {
        let amount_cell = raw.cell(row, amount_col);
        let amount = amount_cell
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or_else(|| ExpenseError::InvalidAmount {
                row,
                value: amount_cell.to_string(),
            })?;

        let provider = provider_col
            .map(|i| raw.cell(row, i).trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let extra: BTreeMap<String, String> = extra_cols
            .iter()
            .map(|(name, i)| ((*name).clone(), raw.cell(row, *i).to_string()))
            .collect();

        records.push(TransactionRecord {
            amount,
            timestamp: raw.cell(row, timestamp_col).to_string(),
            category: raw.cell(row, category_col).to_string(),
            provider,
            extra,
        });
    }
    Ok(records)
}

/// Every timestamp in a table must carry the same zone designator (or none),
/// so that wall-clock calendar fields follow the order of the instants.
fn derive_all(records: Vec<TransactionRecord>) -> Result<Vec<NormalizedTransaction>> {
    let mut zone: Option<Option<FixedOffset>> = None;
    let mut rows = Vec::with_capacity(records.len());
    for (row, record) in records.into_iter().enumerate() {
        let malformed = || ExpenseError::MalformedTimestamp {
            row,
            value: record.timestamp.clone(),
        };
        let parsed = parse_timestamp(&record.timestamp).ok_or_else(malformed)?;
        match zone {
            None => zone = Some(parsed.offset),
            Some(expected) if expected != parsed.offset => return Err(malformed()),
            Some(_) => {}
        }
        rows.push(derive(record, parsed));
    }
    Ok(rows)
}

fn derive(record: TransactionRecord, parsed: ParsedTimestamp) -> NormalizedTransaction {
    let local_time = parsed.local;
    let fixed_variable = classify(&record.category);

    NormalizedTransaction {
        date: local_time.format("%Y-%m-%d").to_string(),
        month: local_time.format("%Y-%m").to_string(),
        year: local_time.format("%Y").to_string(),
        weekday: local_time.format("%A").to_string(),
        fixed_variable,
        local_time,
        utc_offset: parsed.offset,
        record,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn example_table() -> RawTable {
        RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["10", "2025-01-05T10:00:00", "Rent"]),
                cells(&["20", "2025-02-05T10:00:00", "Dining"]),
            ],
        )
    }

    // ── classify ──────────────────────────────────────────────────────────────

    #[test]
    fn test_classify_fixed_set() {
        for category in ["Rent", "Utilities", "Subscription", "Healthcare"] {
            assert_eq!(classify(category), SpendKind::Fixed, "{category}");
        }
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(classify("rent"), SpendKind::Variable);
        assert_eq!(classify("UTILITIES"), SpendKind::Variable);
        assert_eq!(classify(""), SpendKind::Variable);
        assert_eq!(classify("Groceries"), SpendKind::Variable);
    }

    // ── normalize ─────────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_worked_example() {
        let table = normalize(&example_table()).unwrap();
        let rows = table.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "2025-01");
        assert_eq!(rows[1].month, "2025-02");
        assert_eq!(rows[0].fixed_variable, SpendKind::Fixed);
        assert_eq!(rows[1].fixed_variable, SpendKind::Variable);
    }

    #[test]
    fn test_normalize_derives_calendar_fields() {
        let table = normalize(&example_table()).unwrap();
        let first = &table.rows()[0];

        assert_eq!(first.date, "2025-01-05");
        assert_eq!(first.year, "2025");
        assert_eq!(first.weekday, "Sunday");
        assert!((first.amount() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_preserves_row_count_and_order() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["3", "2025-03-01", "Travel"]),
                cells(&["1", "2025-01-01", "Rent"]),
                cells(&["2", "2025-02-01", "Dining"]),
            ],
        );
        let table = normalize(&raw).unwrap();

        let amounts: Vec<f64> = table.rows().iter().map(|r| r.amount()).collect();
        assert_eq!(amounts, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_normalize_does_not_modify_input() {
        let raw = example_table();
        let before = raw.clone();
        normalize(&raw).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = example_table();
        assert_eq!(normalize(&raw).unwrap(), normalize(&raw).unwrap());
    }

    #[test]
    fn test_month_is_monotonic_with_timestamp_order() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["1", "2025-12-01T00:30:00+01:00", "Dining"]),
                cells(&["1", "2024-12-31T23:00:00+01:00", "Dining"]),
                cells(&["1", "2025-02-01T00:10:00+01:00", "Dining"]),
                cells(&["1", "2025-01-31T23:50:00+01:00", "Dining"]),
            ],
        );
        let table = normalize(&raw).unwrap();
        let mut rows: Vec<&NormalizedTransaction> = table.rows().iter().collect();
        rows.sort_by_key(|r| r.instant());

        let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["2024-12", "2025-01", "2025-02", "2025-12"]);
    }

    #[test]
    fn test_mixed_offsets_are_rejected() {
        // 00:30+01:00 is 23:30Z, before 23:45Z, yet its wall-clock month is later.
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["1", "2025-02-01T00:30:00+01:00", "Dining"]),
                cells(&["1", "2025-01-31T23:45:00Z", "Dining"]),
            ],
        );
        match normalize(&raw) {
            Err(ExpenseError::MalformedTimestamp { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "2025-01-31T23:45:00Z");
            }
            other => panic!("expected MalformedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_naive_and_offset_timestamps_do_not_mix() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["1", "2025-01-05T10:00:00", "Dining"]),
                cells(&["1", "2025-01-06T10:00:00Z", "Dining"]),
            ],
        );
        assert!(matches!(
            normalize(&raw),
            Err(ExpenseError::MalformedTimestamp { row: 1, .. })
        ));
    }

    #[test]
    fn test_single_offset_keeps_wall_clock_fields() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["1", "2025-01-31T23:30:00-05:00", "Dining"]),
                cells(&["1", "2025-02-01T08:00:00-0500", "Dining"]),
            ],
        );
        let table = normalize(&raw).unwrap();
        assert_eq!(table.rows()[0].date, "2025-01-31");
        assert_eq!(table.rows()[0].month, "2025-01");
        assert_eq!(table.rows()[1].month, "2025-02");
    }

    #[test]
    fn test_normalize_keeps_provider_and_extra_columns() {
        let raw = RawTable::new(
            &["Amount", "Timestamp", "Category", "Provider", "Account"],
            vec![
                cells(&["4.50", "2025-04-01T09:00:00", "Dining", "Starbucks", "visa"]),
                cells(&["12", "2025-04-02T09:00:00", "Transport", "", "debit"]),
            ],
        );
        let table = normalize(&raw).unwrap();

        assert!(table.schema().has_provider);
        assert_eq!(table.schema().extra_columns, vec!["account".to_string()]);
        assert_eq!(table.rows()[0].record.provider.as_deref(), Some("Starbucks"));
        assert_eq!(table.rows()[1].record.provider, None);
        assert_eq!(table.rows()[1].record.extra["account"], "debit");
    }

    #[test]
    fn test_normalize_empty_table_is_ok() {
        let raw = RawTable::new(&["amount", "timestamp", "category"], vec![]);
        let table = normalize(&raw).unwrap();
        assert!(table.is_empty());
        assert!(table.latest_month().is_none());
    }

    // ── errors ────────────────────────────────────────────────────────────────

    #[test]
    fn test_missing_category_column() {
        let raw = RawTable::new(
            &["amount", "timestamp"],
            vec![cells(&["10", "2025-01-05T10:00:00"])],
        );
        match normalize(&raw) {
            Err(ExpenseError::MissingRequiredColumn(name)) => assert_eq!(name, "category"),
            other => panic!("expected MissingRequiredColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_checked_before_rows() {
        // The bad amount would fail, but the missing column is reported first.
        let raw = RawTable::new(&["amount", "category"], vec![cells(&["x", "Rent"])]);
        assert!(matches!(
            normalize(&raw),
            Err(ExpenseError::MissingRequiredColumn(_))
        ));
    }

    #[test]
    fn test_malformed_timestamp_names_row() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["1", "2025-01-01", "Rent"]),
                cells(&["2", "2025-01-02", "Rent"]),
                cells(&["3", "not a date", "Rent"]),
            ],
        );
        match normalize(&raw) {
            Err(ExpenseError::MalformedTimestamp { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "not a date");
            }
            other => panic!("expected MalformedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_amount_names_row() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![
                cells(&["1", "2025-01-01", "Rent"]),
                cells(&["ten", "2025-01-02", "Rent"]),
            ],
        );
        match normalize(&raw) {
            Err(ExpenseError::InvalidAmount { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "ten");
            }
            other => panic!("expected InvalidAmount, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_amounts_are_rejected() {
        for bad in ["NaN", "inf", "-inf", "infinity"] {
            let raw = RawTable::new(
                &["amount", "timestamp", "category"],
                vec![
                    cells(&["5", "2025-01-01", "Dining"]),
                    cells(&[bad, "2025-01-02", "Rent"]),
                ],
            );
            match normalize(&raw) {
                Err(ExpenseError::InvalidAmount { row, value }) => {
                    assert_eq!(row, 1);
                    assert_eq!(value, bad);
                }
                other => panic!("expected InvalidAmount for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_category_is_classified_verbatim() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category"],
            vec![cells(&["1", "2025-01-01", " Rent"])],
        );
        let table = normalize(&raw).unwrap();
        assert_eq!(table.rows()[0].record.category, " Rent");
        assert_eq!(table.rows()[0].fixed_variable, SpendKind::Variable);
    }

    #[test]
    fn test_raw_columns_named_like_derived_fields_are_replaced() {
        let raw = RawTable::new(
            &["amount", "timestamp", "category", "Month", "date", "note"],
            vec![cells(&["1", "2025-03-04T05:06:07", "Rent", "June", "yesterday", "x"])],
        );
        let table = normalize(&raw).unwrap();

        assert_eq!(table.schema().extra_columns, vec!["note".to_string()]);
        assert_eq!(table.rows()[0].month, "2025-03");
        assert!(!table.rows()[0].record.extra.contains_key("month"));

        let fields = table.schema().groupable_fields();
        let months = fields.iter().filter(|f| f.name() == "month").count();
        assert_eq!(months, 1);

        let json = serde_json::to_string(&table.rows()[0]).unwrap();
        assert_eq!(json.matches("\"month\"").count(), 1);
        assert_eq!(json.matches("\"date\"").count(), 1);
    }

    // ── normalize_records ─────────────────────────────────────────────────────

    #[test]
    fn test_normalize_records_infers_schema() {
        let mut with_extra = TransactionRecord::new(5.0, "2025-05-05T05:05:05", "Travel");
        with_extra
            .extra
            .insert("note".to_string(), "airport".to_string());
        let records = vec![
            TransactionRecord::new(1.0, "2025-05-01", "Rent").with_provider("Landlord"),
            with_extra,
        ];
        let table = normalize_records(&records).unwrap();

        assert!(table.schema().has_provider);
        assert_eq!(table.schema().extra_columns, vec!["note".to_string()]);
        assert_eq!(table.rows()[0].fixed_variable, SpendKind::Fixed);
    }

    #[test]
    fn test_normalize_records_drops_reserved_extra_keys() {
        let mut record = TransactionRecord::new(5.0, "2025-05-05T05:05:05", "Travel");
        record
            .extra
            .insert("weekday".to_string(), "Funday".to_string());
        record.extra.insert("trip".to_string(), "Oslo".to_string());
        let table = normalize_records(&[record]).unwrap();

        assert_eq!(table.schema().extra_columns, vec!["trip".to_string()]);
        assert_eq!(table.rows()[0].weekday, "Monday");
        assert!(!table.rows()[0].record.extra.contains_key("weekday"));
    }

    #[test]
    fn test_normalize_records_malformed_timestamp() {
        let records = vec![TransactionRecord::new(1.0, "2025-13-01", "Rent")];
        assert!(matches!(
            normalize_records(&records),
            Err(ExpenseError::MalformedTimestamp { row: 0, .. })
        ));
    }
}
