// Domain errors for chart configuration and aggregation

/// Reasons a chart request is rejected.
///
/// Every variant is a validation failure raised before any series is produced,
/// so the caller can re-prompt for a different selection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("Unknown chart type '{0}'")]
    UnknownChartType(String),

    #[error("Column '{column}' cannot be used as the x-axis for {chart}")]
    IneligibleXColumn { chart: String, column: String },

    #[error("Column '{column}' cannot be used as the y-axis for {chart}")]
    IneligibleYColumn { chart: String, column: String },

    #[error("Unknown aggregation function '{0}'")]
    UnknownAggregationFunction(String),

    #[error("Cannot apply {function} to non-numeric column '{column}'")]
    InvalidAggregation { function: String, column: String },

    #[error("Grouping column '{0}' has no values")]
    EmptyGroupColumn(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;
