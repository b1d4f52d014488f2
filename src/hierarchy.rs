// Two-level category tree for the sunburst chart

use anyhow::Result;

use crate::aggregate::aggregate;
use crate::config::SunburstOptions;
use crate::data::Table;
use crate::ir::{
    ItemStyle, KeyOrder, LabelVisibility, ReducerSpec, SunburstLeaf, SunburstNode, Tooltip,
};
use crate::palette::CategoryColors;

/// Book count for one (primary, secondary) category pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoLevelCount {
    pub primary: String,
    pub secondary: String,
    pub count: u64,
}

impl TwoLevelCount {
    pub fn new(primary: &str, secondary: &str, count: u64) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
            count,
        }
    }
}

/// Count rows per (primary, secondary) pair, sorted by primary then secondary
pub fn two_level_counts(table: &Table, primary: &str, secondary: &str) -> Result<Vec<TwoLevelCount>> {
    let grouped = aggregate(
        table,
        &[primary, secondary],
        &[ReducerSpec::count("count")],
        KeyOrder::Lexicographic,
    )?;

    Ok(grouped
        .rows
        .into_iter()
        .map(|row| {
            let mut key = row.key.into_iter();
            TwoLevelCount {
                primary: key.next().unwrap_or_default(),
                secondary: key.next().unwrap_or_default(),
                count: row.rows as u64,
            }
        })
        .collect())
}

/// Nest pair counts under their primary category.
///
/// Primaries keep their first-appearance order. Each primary's value is the
/// sum of its children. Shares are taken against the grand total of all
/// counts.
pub fn project_tree(
    counts: &[TwoLevelCount],
    options: &SunburstOptions,
    colors: &CategoryColors,
) -> Vec<SunburstNode> {
    let grand_total: u64 = counts.iter().map(|c| c.count).sum();
    if grand_total == 0 {
        return Vec::new();
    }

    let mut primaries: Vec<&str> = Vec::new();
    for c in counts {
        if !primaries.contains(&c.primary.as_str()) {
            primaries.push(&c.primary);
        }
    }

    primaries
        .into_iter()
        .map(|primary| {
            let children: Vec<SunburstLeaf> = counts
                .iter()
                .filter(|c| c.primary == primary)
                .map(|c| leaf(c, grand_total, options))
                .collect();
            let value: u64 = children.iter().map(|c| c.value).sum();

            SunburstNode {
                name: primary.to_string(),
                value,
                children,
                item_style: ItemStyle {
                    color: colors.color_for(primary).to_string(),
                },
                tooltip: Tooltip {
                    formatter: format!(
                        "{}: {} ({:.2}%)",
                        primary,
                        value,
                        share(value, grand_total)
                    ),
                },
            }
        })
        .collect()
}

fn leaf(count: &TwoLevelCount, grand_total: u64, options: &SunburstOptions) -> SunburstLeaf {
    let percent = share(count.count, grand_total);
    SunburstLeaf {
        name: if percent >= options.name_threshold {
            count.secondary.clone()
        } else {
            String::new()
        },
        category: count.secondary.clone(),
        value: count.count,
        percent,
        tooltip: Tooltip {
            formatter: format!("{}: {} ({:.2}%)", count.secondary, count.count, percent),
        },
        label: LabelVisibility {
            show: percent >= options.label_threshold,
        },
    }
}

fn share(value: u64, total: u64) -> f64 {
    value as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(counts: &[TwoLevelCount]) -> Vec<SunburstNode> {
        project_tree(counts, &SunburstOptions::default(), &CategoryColors::novel_genres())
    }

    #[test]
    fn test_two_children_roll_up() {
        let counts = vec![
            TwoLevelCount::new("都市言情", "总裁", 8),
            TwoLevelCount::new("都市言情", "重生", 2),
        ];
        let tree = project(&counts);

        assert_eq!(tree.len(), 1);
        let node = &tree[0];
        assert_eq!(node.value, 10);
        assert_eq!(node.item_style.color, "#8dd3c7");

        let ceo = &node.children[0];
        assert_eq!(ceo.name, "总裁");
        assert!((ceo.percent - 80.0).abs() < 1e-9);
        assert!(ceo.label.show);

        let rebirth = &node.children[1];
        assert_eq!(rebirth.name, "重生");
        assert!((rebirth.percent - 20.0).abs() < 1e-9);
        assert!(rebirth.label.show);
        assert_eq!(rebirth.tooltip.formatter, "重生: 2 (20.00%)");
    }

    #[test]
    fn test_small_shares_hide_name_and_label() {
        // 1/50 = 2%: name blanked, label hidden
        // 2/50 = 4%: name kept, label hidden
        let counts = vec![
            TwoLevelCount::new("玄幻奇幻", "东方玄幻", 47),
            TwoLevelCount::new("玄幻奇幻", "异世大陆", 2),
            TwoLevelCount::new("武侠仙侠", "古典仙侠", 1),
        ];
        let tree = project(&counts);

        let fantasy = &tree[0];
        assert!(fantasy.children[0].label.show);
        assert_eq!(fantasy.children[1].name, "异世大陆");
        assert!(!fantasy.children[1].label.show);

        let wuxia = &tree[1];
        assert_eq!(wuxia.children[0].name, "");
        assert_eq!(wuxia.children[0].category, "古典仙侠");
        assert!(!wuxia.children[0].label.show);
        assert_eq!(wuxia.children[0].tooltip.formatter, "古典仙侠: 1 (2.00%)");
        // unknown primary falls back
        assert_eq!(wuxia.item_style.color, "#d9d9d9");
    }

    #[test]
    fn test_parent_sums_and_shares_total_100() {
        let counts = vec![
            TwoLevelCount::new("A", "a1", 3),
            TwoLevelCount::new("A", "a2", 4),
            TwoLevelCount::new("B", "b1", 5),
            TwoLevelCount::new("C", "c1", 1),
        ];
        let tree = project(&counts);

        for node in &tree {
            let children: u64 = node.children.iter().map(|c| c.value).sum();
            assert_eq!(node.value, children);
        }

        let total_percent: f64 = tree
            .iter()
            .flat_map(|n| n.children.iter())
            .map(|c| c.percent)
            .sum();
        assert!((total_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input() {
        assert!(project(&[]).is_empty());
    }

    #[test]
    fn test_two_level_counts_from_table() {
        let table = Table::new(
            vec!["一级分类".into(), "二级分类".into()],
            vec![
                vec!["都市言情".into(), "重生".into()],
                vec!["都市言情".into(), "总裁".into()],
                vec!["都市言情".into(), "总裁".into()],
                vec!["历史军事".into(), "".into()],
            ],
        );
        let counts = two_level_counts(&table, "一级分类", "二级分类").unwrap();
        assert_eq!(
            counts,
            vec![
                TwoLevelCount::new("都市言情", "总裁", 2),
                TwoLevelCount::new("都市言情", "重生", 1),
            ]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let tree = project(&[TwoLevelCount::new("其他", "x", 1)]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["itemStyle"]["color"], "#b3de69");
        assert_eq!(json[0]["children"][0]["label"]["show"], true);
        assert!(json[0]["children"][0].get("category").is_none());
    }
}
