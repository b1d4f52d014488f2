use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::parser::{parse_date, parse_number};

/// In-memory sheet: cleaned headers plus raw string cells.
///
/// Every row has exactly `headers.len()` cells; an empty cell means "missing".
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, cleaning headers and padding or truncating rows to the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| clean_header(h)).collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Load a table from disk, picking the reader from the file extension
    pub fn load(path: &Path, sheet: &str) -> Result<Self> {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Self::from_csv_reader(file)
                    .with_context(|| format!("Failed to read CSV {}", path.display()))
            }
            "json" => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                let value: Value = serde_json::from_str(&text)
                    .with_context(|| format!("Invalid JSON in {}", path.display()))?;
                Self::from_json(&value)
            }
            _ => Self::from_workbook(path, sheet),
        }
    }

    /// Read CSV with a header row. Ragged rows are tolerated.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(String::from)
            .collect();

        let mut rows = Vec::new();
        for (idx, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Failed to parse CSV row {}", idx + 1))?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Read one sheet of a spreadsheet workbook (xlsx, xls, xlsm, xlsb, ods)
    pub fn from_workbook(path: &Path, sheet: &str) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook {}", path.display()))?;
        let range = workbook
            .worksheet_range(sheet)
            .with_context(|| format!("Failed to read sheet '{}' of {}", sheet, path.display()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| anyhow!("Sheet '{}' is empty", sheet))?
            .iter()
            .map(cell_text)
            .collect();
        let body: Vec<Vec<String>> = rows.map(|r| r.iter().map(cell_text).collect()).collect();
        debug!(sheet, rows = body.len(), "Read workbook sheet");

        Ok(Self::new(headers, body))
    }

    /// Read a JSON array of objects. Columns are the union of the objects'
    /// keys in first-seen order; a key absent from an object is a missing cell.
    pub fn from_json(value: &Value) -> Result<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| anyhow!("JSON input must be an array of objects"))?;

        let mut headers: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("JSON row {} is not an object", idx + 1))?;
            for key in obj.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            objects.push(obj);
        }

        let rows = objects
            .iter()
            .enumerate()
            .map(|(idx, obj)| {
                headers
                    .iter()
                    .map(|h| {
                        json_cell(obj.get(h))
                            .with_context(|| format!("JSON row {}, field '{}'", idx + 1, h))
                    })
                    .collect::<Result<Vec<String>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(headers, rows))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("Column '{}' not found", name))
    }

    /// Fail with one error naming every column that is absent
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| self.column_index(name).is_err())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            bail!("Missing required columns: {}", missing.join(", "))
        }
    }

    /// Trimmed cell text for coercion, `None` when the cell is empty
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// Cell text exactly as read, for grouping. `None` when empty or whitespace only.
    pub fn key_cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// All cells of one column, `None` where missing
    pub fn text_column(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Ok((0..self.rows.len()).map(|r| self.cell(r, idx)).collect())
    }

    /// A column coerced to numbers; unparseable cells become `None`
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self
            .text_column(name)?
            .into_iter()
            .map(|cell| cell.and_then(parse_number))
            .collect())
    }

    /// A column coerced to dates; unparseable cells become `None`
    pub fn date_column(&self, name: &str) -> Result<Vec<Option<NaiveDate>>> {
        Ok(self
            .text_column(name)?
            .into_iter()
            .map(|cell| cell.and_then(parse_date))
            .collect())
    }

    /// Return a copy with `name` set to `values` (replacing an existing column of that name)
    pub fn with_column(&self, name: &str, values: Vec<Option<String>>) -> Result<Self> {
        if values.len() != self.rows.len() {
            bail!(
                "Derived column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }

        let mut table = self.clone();
        let idx = match table.column_index(name) {
            Ok(idx) => idx,
            Err(_) => {
                table.headers.push(name.to_string());
                for row in &mut table.rows {
                    row.push(String::new());
                }
                table.headers.len() - 1
            }
        };

        for (row, value) in table.rows.iter_mut().zip(values) {
            row[idx] = value.unwrap_or_default();
        }
        Ok(table)
    }
}

/// Remove embedded line breaks, a leading BOM and surrounding whitespace from a header
pub fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

fn json_cell(value: Option<&Value>) -> Result<String> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Null) | None => Ok(String::new()),
        Some(_) => bail!("nested arrays and objects are not supported"),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
    }
}
