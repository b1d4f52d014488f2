// Month bucketing of date columns and the outer join across several of them

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::data::Table;
use crate::ir::{MonthlyCounts, MonthlyTable};
use crate::parser::month_key;

/// Count dates per `YYYY-MM` month; missing dates are skipped
pub fn bucket_by_month<I>(dates: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    let mut buckets = BTreeMap::new();
    for date in dates.into_iter().flatten() {
        *buckets.entry(month_key(date)).or_insert(0) += 1;
    }
    buckets
}

/// Outer join named month counters on the union of their months.
///
/// Months come out in ascending order; a series without a month gets 0.
pub fn join_months(month_column: &str, series: Vec<(String, BTreeMap<String, u64>)>) -> MonthlyTable {
    let months: BTreeSet<&String> = series.iter().flat_map(|(_, b)| b.keys()).collect();

    let rows = months
        .into_iter()
        .map(|month| MonthlyCounts {
            month: month.clone(),
            counts: series
                .iter()
                .map(|(_, buckets)| buckets.get(month).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    MonthlyTable {
        month_column: month_column.to_string(),
        series: series.into_iter().map(|(name, _)| name).collect(),
        rows,
    }
}

/// Bucket each `(output name, date column)` pair of `table` and join the results
pub fn monthly_counts(table: &Table, month_column: &str, columns: &[(&str, &str)]) -> Result<MonthlyTable> {
    let series = columns
        .iter()
        .map(|(name, col)| {
            let dates = table.date_column(col)?;
            Ok((name.to_string(), bucket_by_month(dates)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(join_months(month_column, series))
}

/// Month keys for every row of a date column, `None` where the date is unparseable
pub fn month_keys(table: &Table, column: &str) -> Result<Vec<Option<String>>> {
    Ok(table
        .date_column(column)?
        .into_iter()
        .map(|d| d.map(month_key))
        .collect())
}
