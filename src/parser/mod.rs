// Chart request language parser

pub mod lexer;
pub mod request;

use crate::spec::ChartRequest;
use anyhow::{anyhow, Result};

pub use request::parse_request;

/// Parse a request string, rejecting malformed or trailing input
pub fn parse_chart_request(input: &str) -> Result<ChartRequest> {
    match parse_request(input) {
        Ok((_, request)) => Ok(request),
        Err(e) => Err(anyhow!("Parse error: {}", e)),
    }
}
