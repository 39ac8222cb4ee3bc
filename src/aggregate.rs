// Grouped aggregation over dataset columns

use crate::data::{Column, DataType, Dataset};
use crate::eligibility::ChartType;
use crate::error::{ChartError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationFunction {
    Sum,
    Mean,
    Median,
    Count,
}

impl AggregationFunction {
    pub const ALL: [AggregationFunction; 4] = [
        AggregationFunction::Sum,
        AggregationFunction::Mean,
        AggregationFunction::Median,
        AggregationFunction::Count,
    ];

    /// Aggregation applied when the user did not ask for grouping.
    ///
    /// Bar charts sum and line charts average; charts without a y-axis have none.
    pub fn default_for(chart_type: ChartType) -> Option<Self> {
        match chart_type {
            ChartType::Bar => Some(AggregationFunction::Sum),
            ChartType::Line => Some(AggregationFunction::Mean),
            ChartType::Pie | ChartType::Histogram => None,
        }
    }

    /// Capitalized name used in axis labels
    pub fn label(&self) -> &'static str {
        match self {
            AggregationFunction::Sum => "Sum",
            AggregationFunction::Mean => "Mean",
            AggregationFunction::Median => "Median",
            AggregationFunction::Count => "Count",
        }
    }

    /// Reduce one group. `present` holds the group's non-null values, `rows` its size.
    fn apply(&self, present: &mut [f64], rows: usize) -> f64 {
        match self {
            AggregationFunction::Sum => present.iter().sum(),
            AggregationFunction::Mean => {
                if present.is_empty() {
                    f64::NAN
                } else {
                    present.iter().sum::<f64>() / present.len() as f64
                }
            }
            AggregationFunction::Median => median(present),
            AggregationFunction::Count => rows as f64,
        }
    }
}

impl fmt::Display for AggregationFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AggregationFunction {
    type Err = ChartError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggregationFunction::Sum),
            "mean" | "average" | "avg" => Ok(AggregationFunction::Mean),
            "median" => Ok(AggregationFunction::Median),
            "count" => Ok(AggregationFunction::Count),
            _ => Err(ChartError::UnknownAggregationFunction(s.to_string())),
        }
    }
}

/// One output row of an aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub value: f64,
}

/// One row per distinct group key, in order of first appearance
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct GroupedResult {
    rows: Vec<GroupRow>,
}

impl GroupedResult {
    pub fn rows(&self) -> &[GroupRow] {
        &self.rows
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.value)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.rows.iter().find(|r| r.key == key).map(|r| r.value)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(String, f64)> for GroupedResult {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            rows: iter
                .into_iter()
                .map(|(key, value)| GroupRow { key, value })
                .collect(),
        }
    }
}

/// Group `dataset` by `group_column` and reduce `value_column` within each group
pub fn aggregate(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
    function: AggregationFunction,
) -> Result<GroupedResult> {
    let group = find_column(dataset, group_column)?;
    let value = find_column(dataset, value_column)?;

    if function != AggregationFunction::Count && value.data_type() != DataType::Numeric {
        return Err(ChartError::InvalidAggregation {
            function: function.label().to_string(),
            column: value_column.to_string(),
        });
    }

    let buckets = group_rows(group)?;
    let result: GroupedResult = buckets
        .into_iter()
        .map(|(key, rows)| {
            let mut present: Vec<f64> = rows
                .iter()
                .filter_map(|&row| value.values()[row].as_f64())
                .collect();
            (key, function.apply(&mut present, rows.len()))
        })
        .collect();

    tracing::debug!(
        group = group_column,
        value = value_column,
        function = %function,
        groups = result.len(),
        "Aggregated dataset"
    );
    Ok(result)
}

/// Number of rows per distinct value of `column`, in order of first appearance
pub fn frequency(dataset: &Dataset, column: &str) -> Result<GroupedResult> {
    let col = find_column(dataset, column)?;
    Ok(group_rows(col)?
        .into_iter()
        .map(|(key, rows)| (key, rows.len() as f64))
        .collect())
}

fn find_column<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| ChartError::ColumnNotFound(name.to_string()))
}

/// Row indices per distinct non-null key, keys in first-seen order
fn group_rows(column: &Column) -> Result<Vec<(String, Vec<usize>)>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<usize>)> = Vec::new();
    let mut dropped = 0usize;

    for (row, cell) in column.values().iter().enumerate() {
        if cell.is_null() {
            dropped += 1;
            continue;
        }
        let key = cell.to_string();
        match index.get(&key) {
            Some(&pos) => buckets[pos].1.push(row),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![row]));
            }
        }
    }

    if buckets.is_empty() {
        return Err(ChartError::EmptyGroupColumn(column.name().to_string()));
    }
    if dropped > 0 {
        tracing::warn!(column = column.name(), rows = dropped, "Dropped rows with no group key");
    }
    Ok(buckets)
}

fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
