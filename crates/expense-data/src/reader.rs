//! Loading transaction tables from CSV and JSON files.
//!
//! Readers only produce a [`RawTable`] of string cells; typing and column
//! validation happen in the normalizer.

use std::io::Read;
use std::path::Path;

use expense_core::models::RawTable;
use expense_core::{ExpenseError, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

// ── Public API ────────────────────────────────────────────────────────────────

/// Load `path`, choosing the parser from the file extension.
///
/// `.csv` and `.json` are supported (case-insensitive); anything else fails
/// with [`ExpenseError::UnsupportedFormat`].
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let table = match ext.as_deref() {
        Some("csv") => read_csv(open(path)?)?,
        Some("json") => {
            let mut text = String::new();
            open(path)?
                .read_to_string(&mut text)
                .map_err(|source| ExpenseError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })?;
            parse_json_table(&text)?
        }
        _ => return Err(ExpenseError::UnsupportedFormat(path.to_path_buf())),
    };

    info!(
        "Loaded {} rows with columns [{}] from {}",
        table.len(),
        table.columns().join(", "),
        path.display()
    );
    Ok(table)
}

/// Parse CSV from any reader. The first record is the header row; rows may
/// be shorter or longer than the header.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut table = RawTable::new(&headers, Vec::new());

    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        table.push_row(record.iter().map(str::to_string).collect());
    }

    debug!("Parsed {} CSV rows", table.len());
    Ok(table)
}

/// Parse a JSON table.
///
/// Accepts either an array of objects (columns are the union of their keys)
/// or `{ "columns": [...], "rows": [[...], ...] }`, which keeps column order.
pub fn parse_json_table(text: &str) -> Result<RawTable> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => records_table(&items),
        Value::Object(obj) => columnar_table(&obj),
        other => Err(ExpenseError::InvalidJsonTable(format!(
            "expected an array or object, found {}",
            json_kind(&other)
        ))),
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|source| ExpenseError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn records_table(items: &[Value]) -> Result<RawTable> {
    let mut columns: Vec<String> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            ExpenseError::InvalidJsonTable(format!(
                "element {} is {}, expected an object",
                i,
                json_kind(item)
            ))
        })?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(RawTable::new(&columns, rows))
}

fn columnar_table(obj: &Map<String, Value>) -> Result<RawTable> {
    let columns: Vec<String> = obj
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| ExpenseError::InvalidJsonTable("missing \"columns\" array".to_string()))?
        .iter()
        .map(cell_text)
        .collect();

    let rows = obj
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| ExpenseError::InvalidJsonTable("missing \"rows\" array".to_string()))?
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_array()
                .map(|cells| cells.iter().map(cell_text).collect())
                .ok_or_else(|| {
                    ExpenseError::InvalidJsonTable(format!("row {} is not an array", i))
                })
        })
        .collect::<Result<Vec<Vec<String>>>>()?;

    Ok(RawTable::new(&columns, rows))
}

/// Text of a scalar JSON cell. `null` is empty, nested values keep their
/// JSON text.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    // ── CSV ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_csv_normalizes_headers() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write(
            &tmp,
            "expenses.csv",
            " Amount ,Timestamp,CATEGORY,Provider\n\
             12.50,2025-01-05T10:00:00,Dining,Starbucks\n\
             900,2025-01-01T09:00:00,Rent,\n",
        );
        let table = load_table(&path).unwrap();

        assert_eq!(table.columns(), &["amount", "timestamp", "category", "provider"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 3), "Starbucks");
        assert_eq!(table.cell(1, 3), "");
    }

    #[test]
    fn test_csv_short_rows_and_blank_lines() {
        let text = "amount,timestamp,category,provider\n\
                    1,2025-01-01,Rent\n\
                    ,,,\n\
                    2,2025-01-02,Dining,Uber\n";
        let table = read_csv(text.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 3), "");
        assert_eq!(table.cell(1, 3), "Uber");
    }

    #[test]
    fn test_csv_quoted_fields() {
        let text = "amount,timestamp,category,note\n\
                    \"1,200.00\",2025-01-01,Rent,\"first, last\"\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.cell(0, 0), "1,200.00");
        assert_eq!(table.cell(0, 3), "first, last");
    }

    #[test]
    fn test_csv_header_only() {
        let table = read_csv("amount,timestamp,category\n".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 3);
    }

    // ── JSON ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_json_array_of_records() {
        let text = r#"[
            {"amount": 10, "timestamp": "2025-01-05T10:00:00", "category": "Rent"},
            {"amount": 20.5, "timestamp": "2025-02-05T10:00:00", "category": "Dining", "provider": null}
        ]"#;
        let table = parse_json_table(text).unwrap();
        let amount = table.column_index("amount").unwrap();
        let provider = table.column_index("provider").unwrap();

        assert_eq!(table.columns().len(), 4);
        assert_eq!(table.cell(0, amount), "10");
        assert_eq!(table.cell(1, amount), "20.5");
        assert_eq!(table.cell(0, provider), "");
        assert_eq!(table.cell(1, provider), "");
    }

    #[test]
    fn test_json_columnar() {
        let text = r#"{
            "columns": ["amount", "timestamp", "category"],
            "rows": [[10, "2025-01-05T10:00:00", "Rent"], [20, "2025-02-05", "Dining"]]
        }"#;
        let table = parse_json_table(text).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 2), "Dining");
    }

    #[test]
    fn test_json_rejects_scalar() {
        assert!(matches!(
            parse_json_table("42"),
            Err(ExpenseError::InvalidJsonTable(_))
        ));
    }

    #[test]
    fn test_json_rejects_non_object_element() {
        assert!(matches!(
            parse_json_table(r#"[{"amount": 1}, 2]"#),
            Err(ExpenseError::InvalidJsonTable(_))
        ));
    }

    #[test]
    fn test_json_columnar_requires_rows() {
        assert!(matches!(
            parse_json_table(r#"{"columns": ["amount"]}"#),
            Err(ExpenseError::InvalidJsonTable(_))
        ));
    }

    #[test]
    fn test_json_syntax_error() {
        assert!(matches!(
            parse_json_table("[{"),
            Err(ExpenseError::JsonParse(_))
        ));
    }

    #[test]
    fn test_load_json_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write(
            &tmp,
            "expenses.JSON",
            r#"[{"amount": 3, "timestamp": "2025-03-01", "category": "Travel"}]"#,
        );
        let table = load_table(&path).unwrap();
        assert_eq!(table.len(), 1);
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("absent.csv");
        match load_table(&path) {
            Err(ExpenseError::FileRead { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected FileRead, got {other:?}"),
        }
    }

    #[test]
    fn test_load_unsupported_extension() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write(&tmp, "expenses.xlsx", "");
        assert!(matches!(
            load_table(&path),
            Err(ExpenseError::UnsupportedFormat(_))
        ));
    }
}
