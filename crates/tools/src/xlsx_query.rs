//! Spreadsheet tool — answer simple aggregate questions over a workbook.
//!
//! Every sheet is read with its first row as the header. What gets computed
//! depends on the wording of the query:
//! - "total" + "sales" with a `location`/`city` column → per-location sums
//!   of all numeric columns for the locations the query names
//! - "operating status" / "operational" → value counts of the operating
//!   status column
//! - anything else → a five-row preview
//!
//! Observation: `{raw_query, sheets: [{sheet, type, ...}]}`.

use async_trait::async_trait;
use calamine::{Data, Reader, open_workbook_auto};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracebank_core::error::ToolError;
use tracebank_core::tool::{Observation, Tool};
use tracing::debug;

use crate::str_arg;

const PREVIEW_ROWS: usize = 5;

/// Queries `.xlsx` workbooks.
pub struct XlsxQueryTool;

/// A single cell, reduced to what the aggregates care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Empty => String::new(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => json!(n),
            Self::Text(s) => Value::String(s.clone()),
            Self::Empty => Value::Null,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::String(s) if s.trim().is_empty() => Self::Empty,
            Data::String(s) => Self::Text(s.clone()),
            Data::Bool(b) => Self::Text(b.to_string()),
            Data::Empty => Self::Empty,
            other => Self::Text(other.to_string()),
        }
    }
}

/// One worksheet: header names plus data rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    fn cell(&self, row: &[Cell], col: usize) -> Cell {
        row.get(col).cloned().unwrap_or(Cell::Empty)
    }

    /// Column index by normalized name, first match wins.
    fn find_column(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| pred(&normalize_column(h)))
    }

    /// Columns whose non-empty cells are all numbers (and at least one is).
    fn numeric_columns(&self) -> Vec<usize> {
        (0..self.headers.len())
            .filter(|&col| {
                let mut seen = false;
                for row in &self.rows {
                    match self.cell(row, col) {
                        Cell::Number(_) => seen = true,
                        Cell::Empty => {}
                        Cell::Text(_) => return false,
                    }
                }
                seen
            })
            .collect()
    }
}

/// `" Operating Status/Now "` → `"operating_status_now"`.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '/'], "_")
}

/// Compute the per-sheet summary for `query` (already lowercased).
pub fn summarize_sheet(table: &Table, query: &str) -> Value {
    let mut info = Map::new();
    info.insert("sheet".into(), Value::String(table.name.clone()));

    let location_col = table
        .find_column(|c| c == "location")
        .or_else(|| table.find_column(|c| c == "city"));

    if query.contains("total")
        && query.contains("sales")
        && let Some(loc_col) = location_col
    {
        let numeric = table.numeric_columns();

        let mut mentioned: Vec<String> = Vec::new();
        for row in &table.rows {
            let value = table.cell(row, loc_col).as_text();
            if !value.is_empty()
                && query.contains(&value.to_lowercase())
                && !mentioned.iter().any(|m| m.eq_ignore_ascii_case(&value))
            {
                mentioned.push(value);
            }
        }

        let mut totals = Map::new();
        for location in &mentioned {
            let wanted = location.to_lowercase();
            let mut matched = false;
            let mut sum = 0.0;
            for row in &table.rows {
                if table.cell(row, loc_col).as_text().to_lowercase() != wanted {
                    continue;
                }
                matched = true;
                for &col in &numeric {
                    if let Cell::Number(n) = table.cell(row, col) {
                        sum += n;
                    }
                }
            }
            if matched {
                totals.insert(location.clone(), json!(sum));
            }
        }

        info.insert("type".into(), json!("location_total_sales"));
        info.insert("location_totals".into(), Value::Object(totals));
    } else if query.contains("operating status") || query.contains("operational") {
        let status_col =
            table.find_column(|c| c.contains("operating_status") || c.contains("operating"));

        if let Some(col) = status_col {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            let mut total = 0u64;
            for row in &table.rows {
                let value = table.cell(row, col);
                if value == Cell::Empty {
                    continue;
                }
                total += 1;
                *counts.entry(value.as_text()).or_default() += 1;
            }

            let operational: u64 = counts
                .iter()
                .filter(|(k, _)| k.to_lowercase().contains("operational"))
                .map(|(_, v)| *v)
                .sum();

            info.insert("type".into(), json!("operating_status_counts"));
            info.insert("counts".into(), json!(counts));
            info.insert("total".into(), json!(total));
            info.insert("operational".into(), json!(operational));
        }
    } else {
        let head: Vec<Value> = table
            .rows
            .iter()
            .take(PREVIEW_ROWS)
            .map(|row| {
                let record: Map<String, Value> = table
                    .headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), table.cell(row, i).to_json()))
                    .collect();
                Value::Object(record)
            })
            .collect();

        info.insert("type".into(), json!("preview"));
        info.insert("head".into(), Value::Array(head));
    }

    Value::Object(info)
}

/// Read every sheet of the workbook at `path`.
pub fn load_tables(path: &Path) -> Result<Vec<Table>, ToolError> {
    let failed = |reason: String| ToolError::ExecutionFailed {
        tool_name: "xlsx_query".into(),
        reason,
    };

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| failed(format!("cannot open {}: {e}", path.display())))?;

    let mut tables = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| failed(format!("cannot read sheet '{name}': {e}")))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|header| {
                header
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| match Cell::from(cell) {
                        Cell::Empty => format!("Unnamed: {i}"),
                        other => other.as_text(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        tables.push(Table {
            name,
            headers,
            rows: rows.map(|r| r.iter().map(Cell::from).collect()).collect(),
        });
    }
    Ok(tables)
}

#[async_trait]
impl Tool for XlsxQueryTool {
    fn name(&self) -> &str { "xlsx_query" }

    async fn execute(&self, arguments: Value) -> Result<Observation, ToolError> {
        let path = PathBuf::from(str_arg(&arguments, "path")?);
        let query = str_arg(&arguments, "query")?.to_string();

        if !path.is_file() {
            return Err(ToolError::FileNotFound(path.display().to_string()));
        }

        debug!(path = %path.display(), query = %query, "Querying workbook");

        let tables = tokio::task::spawn_blocking(move || load_tables(&path))
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "xlsx_query".into(),
                reason: e.to_string(),
            })??;

        let lowered = query.to_lowercase();
        let sheets: Vec<Value> = tables.iter().map(|t| summarize_sheet(t, &lowered)).collect();

        Ok(Observation::from_value(json!({
            "raw_query": query,
            "sheets": sheets,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.into())
    }

    fn sales_table() -> Table {
        Table {
            name: "Sales".into(),
            headers: vec!["Location".into(), "Q1".into(), "Q2".into(), "Manager".into()],
            rows: vec![
                vec![text("Wharvton"), Cell::Number(10.0), Cell::Number(5.5), text("Ann")],
                vec![text("Algrimand"), Cell::Number(3.0), Cell::Number(4.0), text("Bo")],
                vec![text("wharvton"), Cell::Number(1.0), Cell::Empty, text("Cy")],
                vec![text("Elsewhere"), Cell::Number(100.0), Cell::Number(1.0), text("Di")],
            ],
        }
    }

    #[test]
    fn normalizes_column_names() {
        assert_eq!(normalize_column(" Operating Status/Now "), "operating_status_now");
    }

    #[test]
    fn location_totals_for_mentioned_places() {
        let query = "which city had the greater total sales: wharvton or algrimand?";
        let summary = summarize_sheet(&sales_table(), query);
        assert_eq!(summary["type"], "location_total_sales");
        let totals = summary["location_totals"].as_object().unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["Wharvton"], json!(16.5));
        assert_eq!(totals["Algrimand"], json!(7.0));
    }

    #[test]
    fn operating_status_counts() {
        let table = Table {
            name: "Sites".into(),
            headers: vec!["Site".into(), "Operating Status".into()],
            rows: vec![
                vec![text("a"), text("Operational")],
                vec![text("b"), text("Closed")],
                vec![text("c"), text("Operational")],
                vec![text("d"), Cell::Empty],
            ],
        };
        let summary = summarize_sheet(&table, "what fraction is operational?");
        assert_eq!(summary["type"], "operating_status_counts");
        assert_eq!(summary["total"], 3);
        assert_eq!(summary["operational"], 2);
        assert_eq!(summary["counts"]["Closed"], 1);
    }

    #[test]
    fn status_query_without_status_column_has_no_type() {
        let summary = summarize_sheet(&sales_table(), "operating status?");
        assert_eq!(summary["sheet"], "Sales");
        assert!(summary.get("type").is_none());
    }

    #[test]
    fn preview_otherwise() {
        let summary = summarize_sheet(&sales_table(), "describe the data");
        assert_eq!(summary["type"], "preview");
        let head = summary["head"].as_array().unwrap();
        assert_eq!(head.len(), 4);
        assert_eq!(head[0]["Location"], "Wharvton");
        assert!(head[2]["Q2"].is_null());
    }

    #[tokio::test]
    async fn missing_workbook_is_file_not_found() {
        let err = XlsxQueryTool
            .execute(json!({"path": "/nonexistent/data.xlsx", "query": "q"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn unreadable_workbook_is_execution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();
        let err = XlsxQueryTool
            .execute(json!({"path": path.to_str().unwrap(), "query": "q"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }
}
