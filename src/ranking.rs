// Per-period category ranking for the rank-over-time bar chart

use anyhow::Result;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::aggregate::aggregate;
use crate::data::Table;
use crate::ir::{KeyOrder, RankTimeline, RankedPeriod, ReducerSpec};

/// What each category is ranked by within a period
#[derive(Debug, Clone, PartialEq)]
pub enum RankValue {
    /// Number of rows
    Count,
    /// Sum of a numeric column
    Sum(String),
}

/// Rank categories inside every period by descending value.
///
/// Periods are independent of each other. Equal values keep the order in
/// which the (period, category) pair first appears in the input.
pub fn rank_by_period(
    table: &Table,
    period_col: &str,
    category_col: &str,
    value: &RankValue,
) -> Result<RankTimeline> {
    let reducer = match value {
        RankValue::Count => ReducerSpec::count("value"),
        RankValue::Sum(col) => ReducerSpec::sum("value", col),
    };
    let grouped = aggregate(table, &[period_col, category_col], &[reducer], KeyOrder::FirstSeen)?;

    let mut periods: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
    for row in grouped.rows {
        let mut key = row.key.into_iter();
        let period = key.next().unwrap_or_default();
        let category = key.next().unwrap_or_default();
        let v = row.values.first().copied().flatten().unwrap_or(0.0);
        periods.entry(period).or_default().push((category, v));
    }

    let by_period: BTreeMap<String, RankedPeriod> = periods
        .into_iter()
        .map(|(period, mut entries)| {
            entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
            let (categories, values) = entries.into_iter().unzip();
            (period, RankedPeriod { categories, values })
        })
        .collect();

    Ok(RankTimeline {
        periods: by_period.keys().cloned().collect(),
        by_period,
    })
}
