// Color assignment for chart categories

/// Fixed colors for the known primary categories, with one fallback so
/// every name maps to some color.
#[derive(Debug, Clone)]
pub struct CategoryColors {
    table: Vec<(String, String)>,
    fallback: String,
}

impl CategoryColors {
    pub fn new(table: Vec<(String, String)>, fallback: impl Into<String>) -> Self {
        Self {
            table,
            fallback: fallback.into(),
        }
    }

    /// The genre palette used by the sunburst chart
    pub fn novel_genres() -> Self {
        let table = [
            ("都市言情", "#8dd3c7"),
            ("玄幻奇幻", "#ffffb3"),
            ("历史军事", "#bebada"),
            ("同人小说", "#fb8072"),
            ("科幻网游", "#80b1d3"),
            ("悬疑灵异", "#fdb462"),
            ("其他", "#b3de69"),
        ];
        Self::new(
            table
                .iter()
                .map(|(name, color)| (name.to_string(), color.to_string()))
                .collect(),
            "#d9d9d9",
        )
    }

    pub fn color_for(&self, name: &str) -> &str {
        self.table
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, color)| color.as_str())
            .unwrap_or(self.fallback.as_str())
    }
}

impl Default for CategoryColors {
    fn default() -> Self {
        Self::novel_genres()
    }
}

/// Hue stepping by 30 degrees per index, wrapping at 360
pub fn hsl_cycle(index: usize) -> String {
    format!("hsl({}, 70%, 50%)", index * 30 % 360)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_fallback_colors() {
        let colors = CategoryColors::novel_genres();
        assert_eq!(colors.color_for("都市言情"), "#8dd3c7");
        assert_eq!(colors.color_for("其他"), "#b3de69");
        assert_eq!(colors.color_for("武侠仙侠"), "#d9d9d9");
        assert_eq!(colors.color_for(""), "#d9d9d9");
    }

    #[test]
    fn test_hsl_cycle_wraps() {
        assert_eq!(hsl_cycle(0), "hsl(0, 70%, 50%)");
        assert_eq!(hsl_cycle(3), "hsl(90, 70%, 50%)");
        assert_eq!(hsl_cycle(12), "hsl(0, 70%, 50%)");
    }
}
