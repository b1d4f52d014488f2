// Run configuration: input/output locations, column names and chart knobs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Everything a chart run needs to know besides the data itself.
///
/// Every field has a default, so a config file only has to name what it
/// changes:
///
/// ```json
/// { "input": "data/books.csv", "radar": { "min_books": 3 } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: PathBuf,
    pub sheet: String,
    pub output_dir: PathBuf,
    pub columns: ColumnMap,
    pub radar: RadarOptions,
    pub sunburst: SunburstOptions,
    pub words: WordOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/飞卢小说数据.xlsx"),
            sheet: "Sheet1".to_string(),
            output_dir: PathBuf::from("visualizations/charts"),
            columns: ColumnMap::default(),
            radar: RadarOptions::default(),
            sunburst: SunburstOptions::default(),
            words: WordOptions::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Source column names, as they read after header cleaning (newlines removed).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub title: String,
    pub author: String,
    pub primary_category: String,
    pub secondary_category: String,
    pub first_day_reward: String,
    pub listing_count: String,
    pub best_rank: String,
    pub worst_rank: String,
    pub first_day_flowers: String,
    pub first_day_reviews: String,
    pub first_day_words: String,
    pub first_listed: String,
    pub last_listed: String,
    pub intake: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            title: "书名".to_string(),
            author: "作者".to_string(),
            primary_category: "一级分类".to_string(),
            secondary_category: "二级分类".to_string(),
            first_day_reward: "首日打赏".to_string(),
            listing_count: "总次数(双榜)".to_string(),
            best_rank: "最好名次(双榜)".to_string(),
            worst_rank: "最差名次(双榜)".to_string(),
            first_day_flowers: "首日鲜花".to_string(),
            first_day_reviews: "首日评价".to_string(),
            first_day_words: "首日字数(千)".to_string(),
            first_listed: "首次上榜日期(双榜)".to_string(),
            last_listed: "末次上榜日期(双榜)".to_string(),
            intake: "入库时间".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadarOptions {
    /// Authors need strictly more books than this to appear
    pub min_books: usize,
}

impl Default for RadarOptions {
    fn default() -> Self {
        Self { min_books: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SunburstOptions {
    /// Leaf names below this share of the grand total (percent) are blanked
    pub name_threshold: f64,
    /// Leaf labels below this share (percent) are hidden
    pub label_threshold: f64,
}

impl Default for SunburstOptions {
    fn default() -> Self {
        Self {
            name_threshold: 2.5,
            label_threshold: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WordOptions {
    /// Words seen fewer times than this are dropped
    pub min_count: usize,
    pub stop_words: Vec<String>,
}

impl Default for WordOptions {
    fn default() -> Self {
        let stop_words = [
            "我", "的", "了", "是", "在", "和", "就", "也", "有", "吧", "这", "那", "你", "他",
            "她", "它", "他们", "我们", "什么", "一个", "不会", "可以", "没有",
        ];
        Self {
            min_count: 70,
            stop_words: stop_words.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "input": "books.csv", "radar": { "min_books": 2 } }"#)
                .unwrap();
        assert_eq!(config.input, PathBuf::from("books.csv"));
        assert_eq!(config.sheet, "Sheet1");
        assert_eq!(config.radar.min_books, 2);
        assert_eq!(config.words.min_count, 70);
        assert_eq!(config.columns.primary_category, "一级分类");
    }

    #[test]
    fn test_column_override() {
        let config: Config =
            serde_json::from_str(r#"{ "columns": { "author": "writer" } }"#).unwrap();
        assert_eq!(config.columns.author, "writer");
        assert_eq!(config.columns.title, "书名");
    }

    #[test]
    fn test_invalid_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let result = Config::from_path(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid config file"));
    }
}
