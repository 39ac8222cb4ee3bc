// Dispatch from a validated chart spec to a plot instruction

use crate::aggregate::{aggregate, frequency, AggregationFunction};
use crate::data::Dataset;
use crate::eligibility::ChartType;
use crate::error::{ChartError, Result};
use crate::ir::{PlotInstruction, Series};
use crate::spec::ChartSpec;

/// Compute the series and labels for a chart spec.
///
/// Pure with respect to its inputs: the same spec and dataset always produce the
/// same instruction.
pub fn to_plot_instruction(spec: &ChartSpec, dataset: &Dataset) -> Result<PlotInstruction> {
    let kind = spec.chart_type();
    let x = spec.x_column();

    let instruction = match kind {
        ChartType::Bar | ChartType::Line => {
            let (y, function) = match (spec.y_column(), spec.aggregation()) {
                (Some(y), Some(function)) => (y, function),
                _ => {
                    return Err(ChartError::IneligibleYColumn {
                        chart: kind.label().to_string(),
                        column: spec.y_column().unwrap_or_default().to_string(),
                    })
                }
            };

            let grouped = aggregate(dataset, x, y, function)?;
            let y_label = value_label(kind, y, function, spec.aggregate_requested());
            PlotInstruction {
                kind,
                series: Series::Grouped(grouped),
                x_label: x.to_string(),
                title: format!("{}: {} by {}", kind.label(), y_label, x),
                y_label: Some(y_label),
            }
        }
        ChartType::Pie => PlotInstruction {
            kind,
            series: Series::Frequency(frequency(dataset, x)?),
            x_label: x.to_string(),
            y_label: None,
            title: format!("{}: Distribution of {}", kind.label(), x),
        },
        ChartType::Histogram => {
            let column = dataset
                .column(x)
                .ok_or_else(|| ChartError::ColumnNotFound(x.to_string()))?;
            let values: Vec<f64> = column.values().iter().filter_map(|v| v.as_f64()).collect();
            PlotInstruction {
                kind,
                series: Series::Raw(values),
                x_label: x.to_string(),
                y_label: Some("Count".to_string()),
                title: format!("{}: Distribution of {}", kind.label(), x),
            }
        }
    };

    tracing::info!(
        chart = %kind,
        points = instruction.series.len(),
        title = %instruction.title,
        "Prepared plot instruction"
    );
    Ok(instruction)
}

/// Y-axis label for bar and line charts
fn value_label(kind: ChartType, y: &str, function: AggregationFunction, requested: bool) -> String {
    if requested {
        return format!("{} of {}", function.label(), y);
    }
    match kind {
        ChartType::Line => format!("Average of {}", y),
        _ => format!("Sum of {}", y),
    }
}
