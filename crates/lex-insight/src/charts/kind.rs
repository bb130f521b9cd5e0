//! The closed set of chart shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    /// Horizontal bars.
    BarH,
    Pie,
    /// One sub-bar per series within each category.
    GroupedBar,
    Line,
    Scatter,
    Histogram,
    /// Correlation matrix.
    Heatmap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::Bar,
        ChartKind::BarH,
        ChartKind::Pie,
        ChartKind::GroupedBar,
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Histogram,
        ChartKind::Heatmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::BarH => "bar_h",
            Self::Pie => "pie",
            Self::GroupedBar => "grouped_bar",
            Self::Line => "line",
            Self::Scatter => "scatter",
            Self::Histogram => "histogram",
            Self::Heatmap => "heatmap",
        }
    }

    /// Whether the kind needs an x column when drawn from a sheet.
    pub fn needs_x_column(&self) -> bool {
        matches!(
            self,
            Self::Bar | Self::BarH | Self::Pie | Self::GroupedBar | Self::Line | Self::Scatter
        )
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names_match_as_str() {
        for kind in ChartKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ChartKind::BarH.to_string(), "bar_h");
        assert_eq!(ChartKind::GroupedBar.to_string(), "grouped_bar");
    }
}
