// End-to-end pipeline: request text + dataset -> plot instruction -> image bytes

use crate::classify::classify;
use crate::data::Dataset;
use crate::graph;
use crate::ir::PlotInstruction;
use crate::parser;
use crate::render::to_plot_instruction;
use crate::spec::build;
use crate::RenderOptions;
use anyhow::{Context, Result};

/// Parse, validate and resolve a request against a dataset
pub fn prepare(request: &str, dataset: &Dataset) -> Result<PlotInstruction> {
    let request = parser::parse_chart_request(request)?;
    let classification = classify(dataset);
    let spec = build(&request, &classification)?;
    let instruction = to_plot_instruction(&spec, dataset)?;
    Ok(instruction)
}

/// Render a request to encoded image bytes
pub fn render_request(request: &str, dataset: &Dataset, options: &RenderOptions) -> Result<Vec<u8>> {
    let instruction = prepare(request, dataset)?;
    graph::render(&instruction, options).context("Failed to render plot")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::read_csv;
    use crate::error::ChartError;
    use crate::ir::Series;

    fn sales() -> Dataset {
        read_csv("region,sales\nNorth,10\nSouth,5\nNorth,20\n".as_bytes()).unwrap()
    }

    #[test]
    fn test_prepare_bar() {
        let instr = prepare("bar(x: region, y: sales)", &sales()).unwrap();
        match instr.series {
            Series::Grouped(g) => {
                assert_eq!(g.get("North"), Some(30.0));
                assert_eq!(g.get("South"), Some(5.0));
            }
            other => panic!("Expected grouped series, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_surfaces_chart_errors() {
        let err = prepare("bar(x: sales, y: sales)", &sales()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChartError>(),
            Some(ChartError::IneligibleXColumn { .. })
        ));
    }

    #[test]
    fn test_prepare_parse_error() {
        let err = prepare("bar(x: region", &sales()).unwrap_err();
        assert!(err.to_string().contains("Parse error"));
    }

    #[test]
    fn test_render_request_png() {
        let bytes = render_request("pie(x: region)", &sales(), &RenderOptions::default()).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
