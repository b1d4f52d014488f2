use anyhow::{anyhow, Result};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// Aggregation
// =============================================================================

/// How a group's values collapse to one number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Missing values count as zero
    Sum,
    /// Missing values are excluded; a group with no valid value yields `None`
    Mean,
    /// Rows in the group, whatever the field content
    Count,
}

/// One output column of an aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct ReducerSpec {
    pub output: String,
    /// Source column; unused for `Count`
    pub source: Option<String>,
    pub op: Reducer,
    pub decimals: Option<u32>,
}

impl ReducerSpec {
    pub fn sum(output: &str, source: &str) -> Self {
        Self::new(output, Some(source), Reducer::Sum)
    }

    pub fn mean(output: &str, source: &str) -> Self {
        Self::new(output, Some(source), Reducer::Mean)
    }

    pub fn count(output: &str) -> Self {
        Self::new(output, None, Reducer::Count)
    }

    /// Round the reduced value to `decimals` places
    pub fn rounded(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    fn new(output: &str, source: Option<&str>, op: Reducer) -> Self {
        Self {
            output: output.to_string(),
            source: source.map(str::to_string),
            op,
            decimals: None,
        }
    }
}

/// Order of groups in an aggregation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    #[default]
    Lexicographic,
    FirstSeen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    /// One entry per key column
    pub key: Vec<String>,
    /// One entry per reducer, `None` when the reducer had nothing to work with
    pub values: Vec<Option<f64>>,
    /// Input rows that fell into this group
    pub rows: usize,
}

/// Grouped and reduced rows.
///
/// Serializes as an array of objects keyed by the key and output column
/// names, in declaration order; missing values serialize as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateTable {
    pub key_columns: Vec<String>,
    pub value_columns: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn value_index(&self, name: &str) -> Result<usize> {
        self.value_columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| anyhow!("Aggregate column '{}' not found", name))
    }

    /// One output column with missing values read as 0
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.value_index(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.values[idx].unwrap_or(0.0))
            .collect())
    }

    /// First key component of each row
    pub fn labels(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.key.first().map(String::as_str).unwrap_or_default())
            .collect()
    }

    /// Keep only groups matching `keep`
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&AggregateRow) -> bool,
    {
        self.rows.retain(keep);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct AggregateRowRef<'a> {
    table: &'a AggregateTable,
    row: &'a AggregateRow,
}

impl Serialize for AggregateRowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let width = self.table.key_columns.len() + self.table.value_columns.len();
        let mut map = serializer.serialize_map(Some(width))?;
        for (name, key) in self.table.key_columns.iter().zip(&self.row.key) {
            map.serialize_entry(name, key)?;
        }
        for (name, value) in self.table.value_columns.iter().zip(&self.row.values) {
            map.serialize_entry(name, &JsonNumber(value.unwrap_or(0.0)))?;
        }
        map.end()
    }
}

impl Serialize for AggregateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&AggregateRowRef { table: self, row })?;
        }
        seq.end()
    }
}

/// A number that serializes as a JSON integer when it has no fractional part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsonNumber(pub f64);

impl Serialize for JsonNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
            serializer.serialize_i64(v as i64)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

fn serialize_numbers<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(values.len()))?;
    for v in values {
        seq.serialize_element(&JsonNumber(*v))?;
    }
    seq.end()
}

// =============================================================================
// Sunburst tree
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemStyle {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub formatter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelVisibility {
    pub show: bool,
}

/// Primary category ring segment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SunburstNode {
    pub name: String,
    /// Sum of the children's values
    pub value: u64,
    pub children: Vec<SunburstLeaf>,
    pub item_style: ItemStyle,
    pub tooltip: Tooltip,
}

/// Secondary category ring segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunburstLeaf {
    /// Display name, blank when the share is under the name threshold
    pub name: String,
    #[serde(skip)]
    pub category: String,
    pub value: u64,
    /// Share of the grand total, in percent
    pub percent: f64,
    pub tooltip: Tooltip,
    pub label: LabelVisibility,
}

// =============================================================================
// Monthly series
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCounts {
    pub month: String,
    /// One count per series, zero-filled
    pub counts: Vec<u64>,
}

/// Several month-bucketed counters joined on the union of their months.
///
/// Serializes as an array of objects: the month column first, then one
/// field per series.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTable {
    pub month_column: String,
    pub series: Vec<String>,
    pub rows: Vec<MonthlyCounts>,
}

impl MonthlyTable {
    pub fn months(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.month.as_str()).collect()
    }

    pub fn series_values(&self, index: usize) -> Vec<u64> {
        self.rows
            .iter()
            .map(|r| r.counts.get(index).copied().unwrap_or(0))
            .collect()
    }
}

struct MonthlyRowRef<'a> {
    table: &'a MonthlyTable,
    row: &'a MonthlyCounts,
}

impl Serialize for MonthlyRowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.series.len() + 1))?;
        map.serialize_entry(&self.table.month_column, &self.row.month)?;
        for (name, count) in self.table.series.iter().zip(&self.row.counts) {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

impl Serialize for MonthlyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&MonthlyRowRef { table: self, row })?;
        }
        seq.end()
    }
}

// =============================================================================
// Rank over time
// =============================================================================

/// Categories of one period, highest value first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPeriod {
    pub categories: Vec<String>,
    #[serde(serialize_with = "serialize_numbers")]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankTimeline {
    /// Periods in ascending order
    pub periods: Vec<String>,
    pub by_period: BTreeMap<String, RankedPeriod>,
}

// =============================================================================
// Word frequency
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub name: String,
    pub value: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table() -> AggregateTable {
        AggregateTable {
            key_columns: vec!["cat".to_string()],
            value_columns: vec!["reward".to_string(), "avg".to_string()],
            rows: vec![
                AggregateRow {
                    key: vec!["A".to_string()],
                    values: vec![Some(10.0), Some(1.25)],
                    rows: 2,
                },
                AggregateRow {
                    key: vec!["B".to_string()],
                    values: vec![Some(5.0), None],
                    rows: 1,
                },
            ],
        }
    }

    #[test]
    fn test_aggregate_table_serializes_records() {
        let json = serde_json::to_value(make_table()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"cat": "A", "reward": 10, "avg": 1.25},
                {"cat": "B", "reward": 5, "avg": 0}
            ])
        );
    }

    #[test]
    fn test_aggregate_table_keeps_column_order() {
        let text = serde_json::to_string(&make_table()).unwrap();
        let cat = text.find("\"cat\"").unwrap();
        let reward = text.find("\"reward\"").unwrap();
        let avg = text.find("\"avg\"").unwrap();
        assert!(cat < reward && reward < avg);
    }

    #[test]
    fn test_values_fill_missing_with_zero() {
        let table = make_table();
        assert_eq!(table.values("avg").unwrap(), vec![1.25, 0.0]);
        assert!(table.values("nope").is_err());
        assert_eq!(table.labels(), vec!["A", "B"]);
    }

    #[test]
    fn test_json_number() {
        assert_eq!(serde_json::to_string(&JsonNumber(3.0)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&JsonNumber(2.5)).unwrap(), "2.5");
    }

    #[test]
    fn test_monthly_table_serializes_records() {
        let table = MonthlyTable {
            month_column: "month".to_string(),
            series: vec!["first".to_string(), "last".to_string()],
            rows: vec![MonthlyCounts {
                month: "2023-01".to_string(),
                counts: vec![2, 0],
            }],
        };
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"month": "2023-01", "first": 2, "last": 0}])
        );
        assert_eq!(table.series_values(1), vec![0]);
    }
}
