// Static HTML pages embedding an ECharts option

use anyhow::{Context, Result};
use serde_json::Value;

pub const ECHARTS_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts/dist/echarts.min.js";
pub const WORDCLOUD_CDN: &str =
    "https://cdn.jsdelivr.net/npm/echarts-wordcloud/dist/echarts-wordcloud.min.js";

/// One self-contained chart page
#[derive(Debug, Clone)]
pub struct Page {
    pub title: String,
    /// Text shown above the chart
    pub heading: Option<String>,
    pub container_id: String,
    pub width: String,
    pub height: String,
    /// Extra script URLs loaded after ECharts
    pub scripts: Vec<String>,
    pub option: Value,
    /// JavaScript run after `option` is defined and before it is applied,
    /// for things JSON cannot carry such as formatter functions
    pub post_script: Option<String>,
}

impl Page {
    pub fn new(title: &str, option: Value) -> Self {
        Self {
            title: title.to_string(),
            heading: None,
            container_id: "chart".to_string(),
            width: "100%".to_string(),
            height: "600px".to_string(),
            scripts: Vec::new(),
            option,
            post_script: None,
        }
    }

    pub fn heading(mut self, text: &str) -> Self {
        self.heading = Some(text.to_string());
        self
    }

    pub fn container(mut self, id: &str, width: &str, height: &str) -> Self {
        self.container_id = id.to_string();
        self.width = width.to_string();
        self.height = height.to_string();
        self
    }

    pub fn script(mut self, url: &str) -> Self {
        self.scripts.push(url.to_string());
        self
    }

    pub fn post_script(mut self, js: &str) -> Self {
        self.post_script = Some(js.to_string());
        self
    }
}

/// Render a page to HTML text
pub fn render_page(page: &Page) -> Result<String> {
    let option = embed_json(&page.option)?;

    let mut scripts = format!("    <script src=\"{}\"></script>\n", ECHARTS_CDN);
    for url in &page.scripts {
        scripts.push_str(&format!("    <script src=\"{}\"></script>\n", escape_html(url)));
    }

    let heading = page
        .heading
        .as_ref()
        .map(|h| {
            format!(
                "    <div style=\"text-align: center; font-size: 20px; margin-bottom: 20px;\">{}</div>\n",
                escape_html(h)
            )
        })
        .unwrap_or_default();

    let post_script = page
        .post_script
        .as_ref()
        .map(|js| format!("\n{}\n", js))
        .unwrap_or_default();

    let id = escape_html(&page.container_id);

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
{scripts}</head>
<body>
{heading}    <div id="{id}" style="width: {width}; height: {height};"></div>
    <script>
        var chartDom = document.getElementById('{id}');
        var myChart = echarts.init(chartDom);
        var option = {option};
{post_script}
        myChart.setOption(option);
        window.addEventListener('resize', function () {{ myChart.resize(); }});
    </script>
</body>
</html>
"#,
        title = escape_html(&page.title),
        scripts = scripts,
        heading = heading,
        id = id,
        width = escape_html(&page.width),
        height = escape_html(&page.height),
        option = option,
        post_script = post_script,
    ))
}

/// Serialize a JSON value so it can sit inside a `<script>` element
pub fn embed_json(value: &Value) -> Result<String> {
    let text = serde_json::to_string(value).context("Failed to serialize chart option")?;
    Ok(text.replace("</", "<\\/"))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
