// Library exports for chartsmith

pub mod aggregate;
pub mod classify;
pub mod csv_reader;
pub mod data;
pub mod eligibility;
pub mod error;
pub mod graph;
pub mod ir;
pub mod parser;
pub mod render;
pub mod runtime;
pub mod spec;

pub use aggregate::{aggregate, frequency, AggregationFunction, GroupedResult};
pub use classify::{classify, Classification, ColumnType};
pub use data::{DataType, Dataset};
pub use eligibility::{eligible_columns, ChartType, EligibleColumns, NOT_SELECTED};
pub use error::ChartError;
pub use ir::{PlotInstruction, Series};
pub use render::to_plot_instruction;
pub use spec::{build, ChartRequest, ChartSpec};

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    /// Format implied by a file extension, if recognized
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(OutputFormat::Png),
            "svg" => Some(OutputFormat::Svg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}

/// Largest accepted image width or height, in pixels
pub const MAX_DIMENSION: u32 = 10_000;

impl RenderOptions {
    /// Parse options from a JSON object; missing fields take their defaults
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let options: RenderOptions = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Invalid render options: {}", e))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject zero or oversized dimensions
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.width == 0 || self.height == 0 {
            anyhow::bail!("Render dimensions must be non-zero");
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            anyhow::bail!(
                "Render dimensions {}x{} exceed the {} pixel limit",
                self.width,
                self.height,
                MAX_DIMENSION
            );
        }
        Ok(())
    }
}
