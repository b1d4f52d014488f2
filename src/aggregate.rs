// Categorical aggregation: group rows by one or more key columns and reduce
// numeric columns with sum / mean / count

use anyhow::Result;
use std::collections::HashMap;
use tracing::warn;

use crate::data::Table;
use crate::ir::{AggregateRow, AggregateTable, KeyOrder, Reducer, ReducerSpec};

/// Group `table` by `keys` and apply every reducer to each group.
///
/// Keys compare on the cell text as read. Rows with a missing cell in any
/// key column are left out; every other distinct key appears exactly once.
pub fn aggregate(
    table: &Table,
    keys: &[&str],
    reducers: &[ReducerSpec],
    order: KeyOrder,
) -> Result<AggregateTable> {
    // 1. Resolve columns
    let key_indices = keys
        .iter()
        .map(|k| table.column_index(k))
        .collect::<Result<Vec<_>>>()?;

    let sources = reducers
        .iter()
        .map(|r| match (&r.op, &r.source) {
            (Reducer::Count, _) | (_, None) => Ok(None),
            (_, Some(col)) => table.numeric_column(col).map(Some),
        })
        .collect::<Result<Vec<_>>>()?;

    // 2. Partition row indices, remembering first appearance
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<String>, Vec<usize>)> = Vec::new();
    let mut skipped = 0usize;

    for row in 0..table.len() {
        let key: Option<Vec<String>> = key_indices
            .iter()
            .map(|&col| table.key_cell(row, col).map(str::to_string))
            .collect();

        let Some(key) = key else {
            skipped += 1;
            continue;
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }

    if skipped > 0 {
        warn!(skipped, keys = ?keys, "Rows without a complete group key were left out");
    }

    // 3. Reduce
    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(key, members)| {
            let values = reducers
                .iter()
                .zip(&sources)
                .map(|(spec, source)| {
                    let column: Vec<Option<f64>> = match source {
                        Some(values) => members.iter().map(|&r| values[r]).collect(),
                        None => vec![None; members.len()],
                    };
                    let reduced = reduce(spec.op, &column);
                    match spec.decimals {
                        Some(d) => reduced.map(|v| round_to(v, d)),
                        None => reduced,
                    }
                })
                .collect();
            AggregateRow {
                key,
                values,
                rows: members.len(),
            }
        })
        .collect();

    // 4. Order
    if order == KeyOrder::Lexicographic {
        rows.sort_by(|a, b| a.key.cmp(&b.key));
    }

    Ok(AggregateTable {
        key_columns: keys.iter().map(|k| k.to_string()).collect(),
        value_columns: reducers.iter().map(|r| r.output.clone()).collect(),
        rows,
    })
}

/// Collapse one group's values
pub fn reduce(op: Reducer, values: &[Option<f64>]) -> Option<f64> {
    match op {
        Reducer::Count => Some(values.len() as f64),
        Reducer::Sum => Some(values.iter().flatten().sum()),
        Reducer::Mean => {
            let valid: Vec<f64> = values.iter().flatten().copied().collect();
            if valid.is_empty() {
                None
            } else {
                Some(valid.iter().sum::<f64>() / valid.len() as f64)
            }
        }
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn make_data() -> Table {
        let rows = [
            ("A", "10", "1", "3"),
            ("A", "bad", "", "5"),
            ("B", "5", "2", "x"),
            ("", "7", "1", "1"),
            ("C", "", "", ""),
        ];
        Table::new(
            vec!["cat".into(), "reward".into(), "best".into(), "worst".into()],
            rows.iter()
                .map(|(c, r, b, w)| vec![c.to_string(), r.to_string(), b.to_string(), w.to_string()])
                .collect(),
        )
    }

    #[test]
    fn test_sum_skips_unparseable() {
        let table = make_data();
        let result = aggregate(
            &table,
            &["cat"],
            &[ReducerSpec::sum("reward", "reward")],
            KeyOrder::Lexicographic,
        )
        .unwrap();

        assert_eq!(result.labels(), vec!["A", "B", "C"]);
        assert_eq!(result.values("reward").unwrap(), vec![10.0, 5.0, 0.0]);
        // fully missing group sums to zero, not missing
        assert_eq!(result.rows[2].values[0], Some(0.0));
    }

    #[test]
    fn test_mean_excludes_missing() {
        let table = make_data();
        let result = aggregate(
            &table,
            &["cat"],
            &[ReducerSpec::mean("worst", "worst")],
            KeyOrder::Lexicographic,
        )
        .unwrap();

        assert_eq!(result.rows[0].values[0], Some(4.0));
        assert_eq!(result.rows[1].values[0], None);
        assert_eq!(result.rows[2].values[0], None);
    }

    #[test]
    fn test_count_counts_rows() {
        let table = make_data();
        let result = aggregate(
            &table,
            &["cat"],
            &[ReducerSpec::count("books")],
            KeyOrder::Lexicographic,
        )
        .unwrap();
        assert_eq!(result.values("books").unwrap(), vec![2.0, 1.0, 1.0]);
        assert_eq!(result.rows[0].rows, 2);
    }

    #[test]
    fn test_keys_match_distinct_non_null_input() {
        let table = make_data();
        let result = aggregate(
            &table,
            &["cat"],
            &[ReducerSpec::count("n")],
            KeyOrder::FirstSeen,
        )
        .unwrap();

        let expected: BTreeSet<&str> = table
            .text_column("cat")
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        let actual: BTreeSet<&str> = result.labels().into_iter().collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_keys_differing_by_whitespace_stay_apart() {
        let table = Table::new(
            vec!["cat".into(), "reward".into()],
            vec![
                vec!["A".into(), "1".into()],
                vec!["A ".into(), "2".into()],
                vec![" ".into(), "4".into()],
            ],
        );
        let result = aggregate(
            &table,
            &["cat"],
            &[ReducerSpec::sum("reward", "reward")],
            KeyOrder::FirstSeen,
        )
        .unwrap();

        // whitespace-only is missing, trailing space is a distinct key
        assert_eq!(result.labels(), vec!["A", "A "]);
        assert_eq!(result.values("reward").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_composite_keys_first_seen_order() {
        let table = Table::new(
            vec!["p".into(), "s".into()],
            vec![
                vec!["Z".into(), "b".into()],
                vec!["A".into(), "a".into()],
                vec!["Z".into(), "a".into()],
                vec!["Z".into(), "b".into()],
                vec!["A".into(), "".into()],
            ],
        );
        let result = aggregate(
            &table,
            &["p", "s"],
            &[ReducerSpec::count("n")],
            KeyOrder::FirstSeen,
        )
        .unwrap();

        let keys: Vec<Vec<String>> = result.rows.iter().map(|r| r.key.clone()).collect();
        assert_eq!(
            keys,
            vec![
                vec!["Z".to_string(), "b".to_string()],
                vec!["A".to_string(), "a".to_string()],
                vec!["Z".to_string(), "a".to_string()],
            ]
        );
        assert_eq!(result.values("n").unwrap(), vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn test_rounding_applies_per_reducer() {
        let table = Table::new(
            vec!["k".into(), "v".into()],
            vec![
                vec!["a".into(), "1".into()],
                vec!["a".into(), "1".into()],
                vec!["a".into(), "2".into()],
            ],
        );
        let result = aggregate(
            &table,
            &["k"],
            &[
                ReducerSpec::mean("raw", "v"),
                ReducerSpec::mean("rounded", "v").rounded(2),
            ],
            KeyOrder::Lexicographic,
        )
        .unwrap();
        assert!((result.rows[0].values[0].unwrap() - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.rows[0].values[1], Some(1.33));
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let table = make_data();
        let result = aggregate(
            &table,
            &["missing"],
            &[ReducerSpec::count("n")],
            KeyOrder::Lexicographic,
        );
        assert!(result.unwrap_err().to_string().contains("missing"));
    }

    #[test]
    fn test_reduce_direct() {
        let values = [Some(1.0), None, Some(3.0)];
        assert_eq!(reduce(Reducer::Sum, &values), Some(4.0));
        assert_eq!(reduce(Reducer::Mean, &values), Some(2.0));
        assert_eq!(reduce(Reducer::Count, &values), Some(3.0));
        assert_eq!(reduce(Reducer::Mean, &[None, None]), None);
        assert_eq!(reduce(Reducer::Sum, &[]), Some(0.0));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345678, 2), 2.35);
        assert_eq!(round_to(10.0, 2), 10.0);
    }
}
