// Runtime executor: load the sheet once, build the requested charts, write

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::charts::{self, ChartKind};
use crate::config::Config;
use crate::data::Table;
use crate::output::{write_artifacts, Artifact};

/// Run every chart in `kinds` against the configured input.
///
/// Nothing is written unless every chart builds, so a bad column or an
/// unreadable input leaves the output directory untouched.
pub fn run(kinds: &[ChartKind], config: &Config) -> Result<Vec<PathBuf>> {
    // 1. Load
    let table = Table::load(&config.input, &config.sheet)
        .with_context(|| format!("Failed to load input {}", config.input.display()))?;
    info!(
        input = %config.input.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "Loaded input"
    );

    // 2. Build in memory
    let artifacts = build_all(kinds, &table, config)?;

    // 3. Persist
    write_artifacts(&config.output_dir, &artifacts)
}

/// Build the artifacts of every chart in `kinds`, checking all of their
/// required columns before any aggregation starts
pub fn build_all(kinds: &[ChartKind], table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    for kind in kinds {
        table
            .require_columns(&kind.required_columns(&config.columns))
            .with_context(|| format!("Cannot build {} chart", kind.name()))?;
    }

    let mut artifacts = Vec::new();
    for kind in kinds {
        let built = charts::build(*kind, table, config)
            .with_context(|| format!("Failed to build {} chart", kind.name()))?;
        debug!(chart = kind.name(), files = built.len(), "Built chart");
        artifacts.extend(built);
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_data() -> Table {
        Table::new(
            vec!["一级分类".into(), "首日打赏".into(), "二级分类".into()],
            vec![
                vec!["都市言情".into(), "10".into(), "总裁".into()],
                vec!["玄幻奇幻".into(), "4".into(), "东方玄幻".into()],
            ],
        )
    }

    #[test]
    fn test_build_all_concatenates_charts() {
        let artifacts = build_all(
            &[ChartKind::Reward, ChartKind::Sunburst],
            &make_data(),
            &Config::default(),
        )
        .unwrap();
        let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                charts::REWARD_JSON,
                charts::REWARD_HTML,
                charts::SUNBURST_JSON,
                charts::SUNBURST_HTML
            ]
        );
    }

    #[test]
    fn test_build_all_checks_every_chart_first() {
        // reward is fine, trend is missing its date columns
        let err = build_all(
            &[ChartKind::Reward, ChartKind::Trend],
            &make_data(),
            &Config::default(),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("trend"));
    }

    #[test]
    fn test_run_missing_input_writes_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let out = scratch.path().join("out");

        let config = Config {
            input: scratch.path().join("nope.csv"),
            output_dir: out.clone(),
            ..Config::default()
        };
        let err = run(&ChartKind::ALL, &config).unwrap_err();
        assert!(format!("{:#}", err).contains("Input file not found"));
        assert!(!out.exists());
    }

    #[test]
    fn test_run_writes_csv_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("books.csv");
        fs::write(&input, "一级分类,首日打赏\n都市言情,3\n都市言情,4\n").unwrap();

        let config = Config {
            input,
            output_dir: dir.path().join("out"),
            ..Config::default()
        };
        let written = run(&[ChartKind::Reward], &config).unwrap();
        assert_eq!(written.len(), 2);

        let json = fs::read_to_string(config.output_dir.join(charts::REWARD_JSON)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!([{"一级分类": "都市言情", "首日打赏": 7}]));
    }
}
