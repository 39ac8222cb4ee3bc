// CSV and JSON loading into a typed Dataset

use crate::data::Dataset;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read CSV with a header row from any reader
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        anyhow::bail!("CSV must have a header row");
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", idx + 1))?;
        rows.push(record.iter().map(|f| f.to_string()).collect::<Vec<String>>());
    }

    if rows.is_empty() {
        anyhow::bail!("CSV must contain at least one data row");
    }

    tracing::debug!(columns = headers.len(), rows = rows.len(), "Read CSV");
    Dataset::from_rows(headers, rows)
}

pub fn read_csv_from_path(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_csv(file).with_context(|| format!("Failed to load '{}'", path.display()))
}

pub fn read_csv_from_stdin() -> Result<Dataset> {
    read_csv(io::stdin().lock())
}

/// Read a JSON array of records
pub fn read_json<R: Read>(reader: R) -> Result<Dataset> {
    let value: serde_json::Value =
        serde_json::from_reader(reader).context("Failed to parse JSON data")?;
    Dataset::from_json(&value)
}

/// Load a dataset, choosing JSON for `.json` files and CSV otherwise
pub fn read_dataset_from_path(path: &Path) -> Result<Dataset> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return read_csv_from_path(path);
    }

    let file = File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_json(io::BufReader::new(file)).with_context(|| format!("Failed to load '{}'", path.display()))
}
