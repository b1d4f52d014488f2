// Chart builders
//
// Each chart has a pure data-shaping function (table -> payload), an option
// builder (payload -> ECharts option JSON) and an artifact assembler that
// renders the page. Nothing here touches the filesystem.

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::aggregate::aggregate;
use crate::config::{ColumnMap, Config};
use crate::data::Table;
use crate::hierarchy::{project_tree, two_level_counts};
use crate::ir::{
    AggregateTable, JsonNumber, KeyOrder, MonthlyTable, RankTimeline, ReducerSpec, SunburstNode,
    WordCount,
};
use crate::output::Artifact;
use crate::palette::{hsl_cycle, CategoryColors};
use crate::ranking::{rank_by_period, RankValue};
use crate::render::{render_page, Page, WORDCLOUD_CDN};
use crate::timeline::{month_keys, monthly_counts};
use crate::words::WordCounter;

// Output file names
pub const REWARD_JSON: &str = "cleaned_data.json";
pub const REWARD_HTML: &str = "reward_visualization.html";
pub const SCATTER_CSV: &str = "清洗后的分类数据.csv";
pub const SCATTER_HTML: &str = "二级分类分析_散点图.html";
pub const RADAR_JSON: &str = "author_radar.json";
pub const RADAR_HTML: &str = "多作者雷达图对比.html";
pub const SUNBURST_JSON: &str = "category_sunburst.json";
pub const SUNBURST_HTML: &str = "hidden_small_labels_sunburst_chart.html";
pub const TREND_JSON: &str = "book_trend_with_storage.json";
pub const TREND_HTML: &str = "书籍动态趋势对比.html";
pub const RACE_JSON: &str = "category_race.json";
pub const RACE_HTML: &str = "动态排序柱状图.html";
pub const WORDS_JSON: &str = "word_freq.json";
pub const WORDS_HTML: &str = "book_titles_wordcloud.html";

// Derived column names
pub const TOTAL_LISTINGS: &str = "总上榜次数";
pub const AVG_RANK: &str = "平均名次";
pub const BOOK_COUNT: &str = "书籍数量";
pub const COLOR: &str = "颜色";
pub const RADAR_AXES: [&str; 5] = [
    "平均上榜次数",
    "平均最好名次",
    "平均首日鲜花",
    "平均首日评价",
    "平均首日字数",
];
pub const MONTH: &str = "月份";
pub const FIRST_LISTED_COUNT: &str = "首次上榜数量";
pub const LAST_LISTED_COUNT: &str = "末次上榜数量";
pub const INTAKE_COUNT: &str = "入库书籍数量";
pub const FIRST_LISTED_MONTH: &str = "首次上榜月份";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Reward,
    Scatter,
    Radar,
    Sunburst,
    Trend,
    Race,
    Words,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Reward,
        ChartKind::Scatter,
        ChartKind::Radar,
        ChartKind::Sunburst,
        ChartKind::Trend,
        ChartKind::Race,
        ChartKind::Words,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChartKind::Reward => "reward",
            ChartKind::Scatter => "scatter",
            ChartKind::Radar => "radar",
            ChartKind::Sunburst => "sunburst",
            ChartKind::Trend => "trend",
            ChartKind::Race => "race",
            ChartKind::Words => "words",
        }
    }

    /// Source columns the chart cannot be built without
    pub fn required_columns(self, columns: &ColumnMap) -> Vec<&str> {
        let cols: Vec<&String> = match self {
            ChartKind::Reward => vec![&columns.primary_category, &columns.first_day_reward],
            ChartKind::Scatter => vec![
                &columns.secondary_category,
                &columns.listing_count,
                &columns.best_rank,
                &columns.worst_rank,
            ],
            ChartKind::Radar => vec![
                &columns.author,
                &columns.listing_count,
                &columns.best_rank,
                &columns.first_day_flowers,
                &columns.first_day_reviews,
                &columns.first_day_words,
            ],
            ChartKind::Sunburst => vec![&columns.primary_category, &columns.secondary_category],
            ChartKind::Trend => vec![&columns.first_listed, &columns.last_listed, &columns.intake],
            ChartKind::Race => vec![&columns.first_listed, &columns.primary_category],
            ChartKind::Words => vec![&columns.title],
        };
        cols.into_iter().map(String::as_str).collect()
    }
}

/// Validate the table for `kind` and produce all of its artifacts
pub fn build(kind: ChartKind, table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    table.require_columns(&kind.required_columns(&config.columns))?;

    match kind {
        ChartKind::Reward => build_reward(table, config),
        ChartKind::Scatter => build_scatter(table, config),
        ChartKind::Radar => build_radar(table, config),
        ChartKind::Sunburst => build_sunburst(table, config),
        ChartKind::Trend => build_trend(table, config),
        ChartKind::Race => build_race(table, config),
        ChartKind::Words => build_words(table, config),
    }
}

// =============================================================================
// Reward pie
// =============================================================================

/// Total first-day reward per primary category
pub fn reward_by_category(table: &Table, columns: &ColumnMap) -> Result<AggregateTable> {
    aggregate(
        table,
        &[columns.primary_category.as_str()],
        &[ReducerSpec::sum(&columns.first_day_reward, &columns.first_day_reward)],
        KeyOrder::Lexicographic,
    )
}

pub fn reward_option(summary: &AggregateTable) -> Result<Value> {
    let column = summary
        .value_columns
        .first()
        .ok_or_else(|| anyhow!("Reward summary has no value column"))?;
    let values = summary.values(column)?;

    let data: Vec<Value> = summary
        .labels()
        .into_iter()
        .zip(values)
        .map(|(name, value)| json!({"name": name, "value": JsonNumber(value)}))
        .collect();

    Ok(json!({
        "title": {"text": "分类打赏总额占比", "left": "center"},
        "tooltip": {"trigger": "item"},
        "legend": {"orient": "vertical", "left": "left"},
        "series": [{
            "name": "打赏总额",
            "type": "pie",
            "radius": "50%",
            "data": data,
            "emphasis": {
                "itemStyle": {
                    "shadowBlur": 10,
                    "shadowOffsetX": 0,
                    "shadowColor": "rgba(0, 0, 0, 0.5)"
                }
            }
        }]
    }))
}

fn build_reward(table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    let summary = reward_by_category(table, &config.columns)?;
    let page = Page::new("Reward Visualization", reward_option(&summary)?)
        .container("main", "600px", "400px");

    Ok(vec![
        Artifact::json(REWARD_JSON, &summary)?,
        Artifact::text(REWARD_HTML, render_page(&page)?),
    ])
}

// =============================================================================
// Secondary category scatter
// =============================================================================

/// Per secondary category: summed listing count, mean of each book's
/// (best + worst) / 2 rank, and book count
pub fn secondary_category_summary(table: &Table, columns: &ColumnMap) -> Result<AggregateTable> {
    let best = table.numeric_column(&columns.best_rank)?;
    let worst = table.numeric_column(&columns.worst_rank)?;
    let avg_rank: Vec<Option<String>> = best
        .iter()
        .zip(&worst)
        .map(|(b, w)| match (b, w) {
            (Some(b), Some(w)) => Some(((b + w) / 2.0).to_string()),
            _ => None,
        })
        .collect();
    let derived = table.with_column(AVG_RANK, avg_rank)?;

    aggregate(
        &derived,
        &[columns.secondary_category.as_str()],
        &[
            ReducerSpec::sum(TOTAL_LISTINGS, &columns.listing_count),
            ReducerSpec::mean(AVG_RANK, AVG_RANK),
            ReducerSpec::count(BOOK_COUNT),
        ],
        KeyOrder::Lexicographic,
    )
}

/// The summary as CSV with a color column; a category without any valid rank
/// leaves its average empty
pub fn scatter_csv(summary: &AggregateTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = summary.key_columns.iter().map(String::as_str).collect();
    header.extend(summary.value_columns.iter().map(String::as_str));
    header.push(COLOR);
    writer.write_record(&header)?;

    for (i, row) in summary.rows.iter().enumerate() {
        let mut record: Vec<String> = row.key.clone();
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        record.push(hsl_cycle(i));
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finish scatter CSV: {}", e.error()))
}

pub fn scatter_option(summary: &AggregateTable) -> Result<Value> {
    let totals = summary.values(TOTAL_LISTINGS)?;
    let ranks = summary.values(AVG_RANK)?;
    let counts = summary.values(BOOK_COUNT)?;

    let points: Vec<Value> = summary
        .labels()
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let value = vec![JsonNumber(totals[i]), JsonNumber(ranks[i]), JsonNumber(counts[i])];
            json!({
                "name": name,
                "value": value,
                "itemStyle": {"color": hsl_cycle(i)},
                "symbolSize": counts[i].sqrt() * 10.0
            })
        })
        .collect();

    Ok(json!({
        "title": {"text": "二级分类分析", "left": "center"},
        "tooltip": {},
        "xAxis": {"name": TOTAL_LISTINGS, "type": "value"},
        "yAxis": {"name": AVG_RANK, "type": "value", "inverse": true},
        "series": [{"name": "分类分析", "type": "scatter", "data": points}]
    }))
}

const SCATTER_TOOLTIP: &str = r#"        option.tooltip.formatter = function (params) {
            return '分类: ' + params.data.name +
                '<br>总上榜次数: ' + params.data.value[0] +
                '<br>平均名次: ' + params.data.value[1] +
                '<br>书籍数量: ' + params.data.value[2];
        };"#;

fn build_scatter(table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    let summary = secondary_category_summary(table, &config.columns)?;
    let page = Page::new("二级分类分析", scatter_option(&summary)?).post_script(SCATTER_TOOLTIP);

    Ok(vec![
        Artifact::csv_with_bom(SCATTER_CSV, scatter_csv(&summary)?),
        Artifact::text(SCATTER_HTML, render_page(&page)?),
    ])
}

// =============================================================================
// Author radar
// =============================================================================

/// Per-author means (2 decimals) for authors with more than `min_books` books
pub fn author_profiles(table: &Table, columns: &ColumnMap, min_books: usize) -> Result<AggregateTable> {
    let sources = [
        &columns.listing_count,
        &columns.best_rank,
        &columns.first_day_flowers,
        &columns.first_day_reviews,
        &columns.first_day_words,
    ];
    let reducers: Vec<ReducerSpec> = RADAR_AXES
        .iter()
        .zip(sources)
        .map(|(axis, source)| ReducerSpec::mean(axis, source).rounded(2))
        .collect();

    let mut stats = aggregate(
        table,
        &[columns.author.as_str()],
        &reducers,
        KeyOrder::Lexicographic,
    )?;
    stats.retain(|row| row.rows > min_books);
    Ok(stats)
}

pub fn radar_option(stats: &AggregateTable) -> Value {
    let indicator: Vec<Value> = RADAR_AXES.iter().map(|axis| json!({"name": axis})).collect();
    let data: Vec<Value> = stats
        .rows
        .iter()
        .map(|row| {
            let value: Vec<JsonNumber> = row
                .values
                .iter()
                .map(|v| JsonNumber(v.unwrap_or(0.0)))
                .collect();
            json!({"name": row.key.first(), "value": value})
        })
        .collect();

    json!({
        "title": {"text": "多作者维度雷达图", "left": "center"},
        "tooltip": {"trigger": "item"},
        "legend": {"top": "bottom", "data": stats.labels()},
        "radar": {"indicator": indicator},
        "series": [{"name": "作者对比", "type": "radar", "data": data}]
    })
}

fn build_radar(table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    let stats = author_profiles(table, &config.columns, config.radar.min_books)?;
    let heading = format!("超过{}本书籍的作者维度对比", config.radar.min_books);
    let page = Page::new("多作者雷达图对比", radar_option(&stats))
        .heading(&heading)
        .container("radar-chart", "100%", "600px");

    Ok(vec![
        Artifact::json(RADAR_JSON, &stats)?,
        Artifact::text(RADAR_HTML, render_page(&page)?),
    ])
}

// =============================================================================
// Category sunburst
// =============================================================================

pub fn category_tree(table: &Table, config: &Config) -> Result<Vec<SunburstNode>> {
    let counts = two_level_counts(
        table,
        &config.columns.primary_category,
        &config.columns.secondary_category,
    )?;
    Ok(project_tree(&counts, &config.sunburst, &CategoryColors::novel_genres()))
}

pub fn sunburst_option(tree: &[SunburstNode], label_threshold: f64) -> Value {
    json!({
        "title": {"text": format!("小说分类旭日图（隐藏小于{}%的分类名称）", label_threshold)},
        "tooltip": {"trigger": "item"},
        "series": [{
            "type": "sunburst",
            "name": "小说分类",
            "data": tree,
            "radius": ["10%", "90%"],
            "label": {"fontSize": 12, "formatter": "{b}", "position": "inside"}
        }]
    })
}

fn build_sunburst(table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    let tree = category_tree(table, config)?;
    let page = Page::new(
        "小说分类旭日图",
        sunburst_option(&tree, config.sunburst.label_threshold),
    );

    Ok(vec![
        Artifact::json(SUNBURST_JSON, &tree)?,
        Artifact::text(SUNBURST_HTML, render_page(&page)?),
    ])
}

// =============================================================================
// Listing trend lines
// =============================================================================

/// Monthly counts of first listings, last listings and intakes
pub fn listing_trend(table: &Table, columns: &ColumnMap) -> Result<MonthlyTable> {
    monthly_counts(
        table,
        MONTH,
        &[
            (FIRST_LISTED_COUNT, columns.first_listed.as_str()),
            (LAST_LISTED_COUNT, columns.last_listed.as_str()),
            (INTAKE_COUNT, columns.intake.as_str()),
        ],
    )
}

pub fn trend_option(trend: &MonthlyTable) -> Value {
    let series: Vec<Value> = trend
        .series
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"name": name, "type": "line", "data": trend.series_values(i)}))
        .collect();

    json!({
        "title": {"text": "书籍动态趋势对比"},
        "tooltip": {"trigger": "axis"},
        "legend": {"data": trend.series},
        "xAxis": {"type": "category", "data": trend.months()},
        "yAxis": {"type": "value", "name": BOOK_COUNT},
        "series": series
    })
}

fn build_trend(table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    let trend = listing_trend(table, &config.columns)?;
    let page = Page::new("书籍动态趋势对比", trend_option(&trend))
        .container("trend-chart", "100%", "600px");

    Ok(vec![
        Artifact::json(TREND_JSON, &trend)?,
        Artifact::text(TREND_HTML, render_page(&page)?),
    ])
}

// =============================================================================
// Category race (rank over time)
// =============================================================================

/// Primary categories ranked by books first listed in each month
pub fn category_race(table: &Table, columns: &ColumnMap) -> Result<RankTimeline> {
    let months = month_keys(table, &columns.first_listed)?;
    let derived = table.with_column(FIRST_LISTED_MONTH, months)?;
    rank_by_period(
        &derived,
        FIRST_LISTED_MONTH,
        &columns.primary_category,
        &RankValue::Count,
    )
}

pub fn race_option(timeline: &RankTimeline) -> Value {
    let options: Vec<Value> = timeline
        .by_period
        .values()
        .map(|ranked| {
            let values: Vec<JsonNumber> = ranked.values.iter().map(|v| JsonNumber(*v)).collect();
            json!({
                "yAxis": {"data": ranked.categories},
                "series": [{"data": values}]
            })
        })
        .collect();

    json!({
        "baseOption": {
            "timeline": {
                "axisType": "category",
                "autoPlay": true,
                "playInterval": 2000,
                "data": timeline.periods
            },
            "tooltip": {"trigger": "axis", "axisPointer": {"type": "shadow"}},
            "xAxis": {"type": "value", "name": "首次上榜书籍总数"},
            "yAxis": {"type": "category", "inverse": true},
            "series": [{
                "type": "bar",
                "label": {"show": true, "position": "right", "formatter": "{c}"}
            }]
        },
        "options": options
    })
}

fn build_race(table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    let timeline = category_race(table, &config.columns)?;
    let page = Page::new("动态排序柱状图", race_option(&timeline))
        .container("dynamic-bar", "100%", "600px");

    Ok(vec![
        Artifact::json(RACE_JSON, &timeline)?,
        Artifact::text(RACE_HTML, render_page(&page)?),
    ])
}

// =============================================================================
// Title word cloud
// =============================================================================

pub fn title_words(table: &Table, config: &Config) -> Result<Vec<WordCount>> {
    let titles = table.text_column(&config.columns.title)?;
    let counter = WordCounter::jieba(&config.words);
    Ok(counter.count(titles.into_iter().flatten()))
}

pub fn wordcloud_option(words: &[WordCount]) -> Value {
    json!({
        "tooltip": {"show": true},
        "series": [{
            "type": "wordCloud",
            "gridSize": 2,
            "sizeRange": [12, 50],
            "rotationRange": [-90, 90],
            "shape": "circle",
            "width": 800,
            "height": 600,
            "drawOutOfBound": true,
            "textStyle": {"fontFamily": "sans-serif", "fontWeight": "bold"},
            "data": words
        }]
    })
}

const WORDCLOUD_COLORS: &str = r#"        option.series[0].textStyle.color = function () {
            return 'rgb(' + [
                Math.round(Math.random() * 255),
                Math.round(Math.random() * 255),
                Math.round(Math.random() * 255)
            ].join(',') + ')';
        };"#;

fn build_words(table: &Table, config: &Config) -> Result<Vec<Artifact>> {
    let words = title_words(table, config)?;
    let page = Page::new("词云图", wordcloud_option(&words))
        .heading("基于书名的词云图")
        .container("main", "800px", "600px")
        .script(WORDCLOUD_CDN)
        .post_script(WORDCLOUD_COLORS);

    Ok(vec![
        Artifact::json(WORDS_JSON, &words)?,
        Artifact::text(WORDS_HTML, render_page(&page)?),
    ])
}
