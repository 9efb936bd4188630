//! Plain-text tables with a header rule and optional totals row.
//!
//! Column widths are measured in terminal display cells so category names
//! with wide characters stay aligned.

use unicode_width::UnicodeWidthStr;

/// A table assembled row by row and rendered to a string.
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    totals: Option<Vec<String>>,
}

impl TextTable {
    /// A table whose first column is left-aligned and the rest right-aligned,
    /// which suits a label followed by numbers.
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
            totals: None,
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Set the row rendered below a separator at the bottom.
    pub fn set_totals(&mut self, cells: Vec<String>) {
        self.totals = Some(cells);
    }

    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let rule = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ");

        let mut out = String::new();
        out.push_str(&Self::render_line(&self.headers, &widths));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&Self::render_line(row, &widths));
            out.push('\n');
        }
        if let Some(totals) = &self.totals {
            out.push_str(&rule);
            out.push('\n');
            out.push_str(&Self::render_line(totals, &widths));
            out.push('\n');
        }
        out
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in self.rows.iter().chain(self.totals.iter()) {
            for (i, cell) in row.iter().enumerate() {
                if i >= widths.len() {
                    widths.push(0);
                }
                widths[i] = widths[i].max(cell.width());
            }
        }
        widths
    }

    fn render_line(cells: &[String], widths: &[usize]) -> String {
        let line = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let pad = " ".repeat(width.saturating_sub(cell.width()));
                if i == 0 {
                    format!("{cell}{pad}")
                } else {
                    format!("{pad}{cell}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_string()
    }
}
