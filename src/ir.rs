use crate::aggregate::GroupedResult;
use crate::eligibility::ChartType;
use serde::Serialize;

/// Data carried by a plot instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Series {
    /// One aggregated value per x category (bar, line)
    Grouped(GroupedResult),
    /// Occurrence count per distinct value (pie)
    Frequency(GroupedResult),
    /// Unbinned numeric values; the renderer picks the bins (histogram)
    Raw(Vec<f64>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Grouped(g) | Series::Frequency(g) => g.len(),
            Series::Raw(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backend-agnostic description of what to draw.
///
/// The renderer executes it blindly; all data decisions are already made.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotInstruction {
    pub kind: ChartType,
    pub series: Series,
    pub x_label: String,
    pub y_label: Option<String>,
    pub title: String,
}
