// Validation of chart requests into immutable chart specifications

use crate::aggregate::AggregationFunction;
use crate::classify::Classification;
use crate::eligibility::{eligible_columns, ChartType, NOT_SELECTED};
use crate::error::{ChartError, Result};
use serde::Serialize;

/// A user's chart selection as supplied by the UI or the command line.
///
/// Names are raw strings; nothing here has been validated yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChartRequest {
    pub chart_type: String,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub aggregate_requested: bool,
    pub aggregation: Option<String>,
}

impl ChartRequest {
    pub fn new(chart_type: impl Into<String>) -> Self {
        Self {
            chart_type: chart_type.into(),
            ..Default::default()
        }
    }

    pub fn x(mut self, column: impl Into<String>) -> Self {
        self.x_column = Some(column.into());
        self
    }

    pub fn y(mut self, column: impl Into<String>) -> Self {
        self.y_column = Some(column.into());
        self
    }

    /// Request explicit grouping with the named function
    pub fn aggregate(mut self, function: impl Into<String>) -> Self {
        self.aggregate_requested = true;
        self.aggregation = Some(function.into());
        self
    }
}

/// A validated chart configuration.
///
/// `y_column` and `aggregation` are set only for bar and line charts. For those the
/// aggregation is always present: the requested one, or the chart's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    chart_type: ChartType,
    x_column: String,
    y_column: Option<String>,
    aggregation: Option<AggregationFunction>,
    aggregate_requested: bool,
}

impl ChartSpec {
    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    pub fn x_column(&self) -> &str {
        &self.x_column
    }

    pub fn y_column(&self) -> Option<&str> {
        self.y_column.as_deref()
    }

    pub fn aggregation(&self) -> Option<AggregationFunction> {
        self.aggregation
    }

    pub fn aggregate_requested(&self) -> bool {
        self.aggregate_requested
    }
}

/// Validate a request against the classified dataset columns.
///
/// Checks run in order and stop at the first failure: chart type, x column,
/// y column (bar/line only), aggregation function (bar/line with grouping requested).
pub fn build(request: &ChartRequest, classification: &Classification) -> Result<ChartSpec> {
    let chart_type: ChartType = request.chart_type.parse()?;
    let eligible = eligible_columns(classification, chart_type);

    let x_column = selection(&request.x_column)
        .filter(|x| eligible.x.iter().any(|c| c.as_str() == *x))
        .ok_or_else(|| ChartError::IneligibleXColumn {
            chart: chart_type.label().to_string(),
            column: shown(&request.x_column),
        })?
        .to_string();

    let spec = match chart_type {
        ChartType::Bar | ChartType::Line => {
            let y_column = selection(&request.y_column)
                .filter(|y| eligible.y.iter().any(|c| c.as_str() == *y))
                .ok_or_else(|| ChartError::IneligibleYColumn {
                    chart: chart_type.label().to_string(),
                    column: shown(&request.y_column),
                })?
                .to_string();

            let aggregation = if request.aggregate_requested {
                let name = request.aggregation.as_deref().unwrap_or(NOT_SELECTED);
                Some(name.parse::<AggregationFunction>()?)
            } else {
                AggregationFunction::default_for(chart_type)
            };

            ChartSpec {
                chart_type,
                x_column,
                y_column: Some(y_column),
                aggregation,
                aggregate_requested: request.aggregate_requested,
            }
        }
        ChartType::Pie | ChartType::Histogram => ChartSpec {
            chart_type,
            x_column,
            y_column: None,
            aggregation: None,
            aggregate_requested: false,
        },
    };

    tracing::debug!(?spec, "Built chart spec");
    Ok(spec)
}

/// A real column choice, i.e. neither missing, blank, nor the sentinel
fn selection(choice: &Option<String>) -> Option<&str> {
    choice
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != NOT_SELECTED)
}

fn shown(choice: &Option<String>) -> String {
    choice.clone().unwrap_or_else(|| NOT_SELECTED.to_string())
}
