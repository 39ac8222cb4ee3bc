// Chart types and the axis eligibility table

use crate::classify::{Classification, ColumnType};
use crate::error::ChartError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Placeholder option shown ahead of real column choices
pub const NOT_SELECTED: &str = "Not selected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Histogram,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [
        ChartType::Bar,
        ChartType::Line,
        ChartType::Pie,
        ChartType::Histogram,
    ];

    /// Display label, e.g. "Bar Chart"
    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Bar => "Bar Chart",
            ChartType::Line => "Line Chart",
            ChartType::Pie => "Pie Chart",
            ChartType::Histogram => "Histogram",
        }
    }

    /// Name used in chart requests, e.g. "bar"
    pub fn keyword(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Histogram => "histogram",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChartType::Bar => "A bar chart presents categorical data with rectangular bars with heights or lengths proportional to the values they represent.",
            ChartType::Line => "A line chart displays information as a series of data points connected by straight line segments.",
            ChartType::Pie => "A pie chart is a circular statistical graphic, which is divided into slices to illustrate numerical proportion.",
            ChartType::Histogram => "A histogram is a type of bar chart that represents the distribution of data by forming bins along the range of the data and drawing bars to show the number of observations in each bin.",
        }
    }

    /// Whether the chart plots an aggregated y column
    pub fn uses_y_axis(&self) -> bool {
        match self {
            ChartType::Bar | ChartType::Line => true,
            ChartType::Pie | ChartType::Histogram => false,
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    /// Accepts "bar", "Bar Chart", "bar_chart", "HISTOGRAM", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', " ");
        let base = normalized
            .strip_suffix(" chart")
            .unwrap_or(normalized.as_str())
            .trim();
        match base {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "pie" => Ok(ChartType::Pie),
            "histogram" | "hist" => Ok(ChartType::Histogram),
            _ => Err(ChartError::UnknownChartType(s.to_string())),
        }
    }
}

/// Columns a user may choose for each axis
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EligibleColumns {
    pub x: Vec<String>,
    pub y: Vec<String>,
}

impl EligibleColumns {
    /// X options with the sentinel prepended
    pub fn x_options(&self) -> Vec<String> {
        with_sentinel(&self.x)
    }

    /// Y options with the sentinel prepended; empty when the chart has no y-axis
    pub fn y_options(&self) -> Vec<String> {
        if self.y.is_empty() {
            Vec::new()
        } else {
            with_sentinel(&self.y)
        }
    }
}

fn with_sentinel(columns: &[String]) -> Vec<String> {
    std::iter::once(NOT_SELECTED.to_string())
        .chain(columns.iter().cloned())
        .collect()
}

/// Resolve the x and y candidates for a chart type
pub fn eligible_columns(classification: &Classification, chart_type: ChartType) -> EligibleColumns {
    let categorical = classification.columns_of(ColumnType::Categorical);

    let eligible = match chart_type {
        ChartType::Bar | ChartType::Line => {
            let mut x = categorical;
            x.extend(classification.columns_of(ColumnType::Temporal));
            EligibleColumns {
                x,
                y: classification.columns_of(ColumnType::Numeric),
            }
        }
        ChartType::Pie => EligibleColumns {
            x: categorical,
            y: Vec::new(),
        },
        ChartType::Histogram => EligibleColumns {
            x: classification.columns_of(ColumnType::Numeric),
            y: Vec::new(),
        },
    };

    tracing::debug!(
        chart = %chart_type,
        x = eligible.x.len(),
        y = eligible.y.len(),
        "Resolved eligible columns"
    );
    eligible
}

/// Like [`eligible_columns`], but an unrecognized chart name yields no candidates at all
pub fn eligible_columns_for_name(classification: &Classification, chart_name: &str) -> EligibleColumns {
    match chart_name.parse::<ChartType>() {
        Ok(chart_type) => eligible_columns(classification, chart_type),
        Err(_) => EligibleColumns::default(),
    }
}
