// Semantic column classification

use crate::data::{DataType, Dataset};
use serde::Serialize;
use std::fmt;

/// Semantic role a column can play on a chart axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Temporal,
}

impl ColumnType {
    fn from_data_type(data_type: DataType) -> Option<Self> {
        match data_type {
            DataType::Numeric => Some(ColumnType::Numeric),
            DataType::Text => Some(ColumnType::Categorical),
            DataType::Temporal => Some(ColumnType::Temporal),
            DataType::Boolean | DataType::Unknown => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Temporal => "temporal",
        };
        f.write_str(name)
    }
}

/// Column name to semantic type, in dataset column order.
///
/// Columns that could not be classified keep a `None` entry so they stay visible
/// to callers but never become eligible for an axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Classification {
    columns: Vec<(String, Option<ColumnType>)>,
}

impl Classification {
    pub fn new(columns: Vec<(String, Option<ColumnType>)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, t)| *t)
    }

    /// Names of the columns with the given type, in dataset order
    pub fn columns_of(&self, column_type: ColumnType) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, t)| *t == Some(column_type))
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<ColumnType>)> {
        self.columns.iter().map(|(n, t)| (n.as_str(), *t))
    }

    pub fn unclassified(&self) -> Vec<&str> {
        self.iter().filter(|(_, t)| t.is_none()).map(|(n, _)| n).collect()
    }
}

/// Classify every column of the dataset by its declared type
pub fn classify(dataset: &Dataset) -> Classification {
    let columns: Vec<(String, Option<ColumnType>)> = dataset
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), ColumnType::from_data_type(c.data_type())))
        .collect();

    let classification = Classification::new(columns);
    tracing::debug!(
        columns = dataset.columns().len(),
        unclassified = classification.unclassified().len(),
        "Classified dataset columns"
    );
    classification
}
