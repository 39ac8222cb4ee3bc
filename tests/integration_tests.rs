use serde_json::Value;
use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Run chartsmith with arguments, optionally feeding stdin
fn run_chartsmith(args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_chartsmith"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn chartsmith");

    if let Some(mut handle) = child.stdin.take() {
        if let Some(input) = stdin {
            handle
                .write_all(input.as_bytes())
                .expect("Failed to write to stdin");
        }
    }

    child.wait_with_output().expect("Failed to wait for chartsmith")
}

/// Run `plot` and return stdout, or stderr on failure
fn plot(args: &[&str]) -> Result<Vec<u8>, String> {
    let mut full = vec!["plot"];
    full.extend_from_slice(args);
    let output = run_chartsmith(&full, None);
    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

fn plot_json(file: &str, request: &str) -> Value {
    let bytes = plot(&[file, request, "--emit", "json"]).expect("plot failed");
    serde_json::from_slice(&bytes).expect("Output is not valid JSON")
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

#[test]
fn test_end_to_end_bar_chart() {
    let result = plot(&["test/sales.csv", "bar(x: region, y: sales)"]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_line_chart() {
    let result = plot(&["test/timeseries.csv", "line(x: date, y: temperature)"]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_pie_chart() {
    let result = plot(&["test/sales.csv", "pie(x: product)"]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_histogram() {
    let result = plot(&["test/timeseries.csv", "histogram(x: temperature)"]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_bar_json_sums_by_default() {
    let json = plot_json("test/sales.csv", "bar(x: region, y: sales)");
    assert_eq!(json["kind"], "bar");
    assert_eq!(json["title"], "Bar Chart: Sum of sales by region");
    assert_eq!(json["y_label"], "Sum of sales");
    assert_eq!(json["series"]["type"], "grouped");

    // Blank region row is dropped; East has no sales values
    let rows = json["series"]["data"].as_array().unwrap();
    let keys: Vec<&str> = rows.iter().map(|r| r["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["North", "South", "East"]);
    assert_eq!(rows[0]["value"], 220.5);
    assert_eq!(rows[1]["value"], 140.25);
    assert_eq!(rows[2]["value"], 0.0);
}

#[test]
fn test_line_json_averages_by_default() {
    let json = plot_json("test/timeseries.csv", "line(x: date, y: temperature)");
    assert_eq!(json["y_label"], "Average of temperature");
    let rows = json["series"]["data"].as_array().unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["key"], "2024-01-01");
    assert_eq!(rows[0]["value"], 21.5);
}

#[test]
fn test_explicit_aggregation() {
    let json = plot_json("test/sales.csv", "bar(x: region, y: units, agg: count)");
    assert_eq!(json["y_label"], "Count of units");
    let rows = json["series"]["data"].as_array().unwrap();
    assert_eq!(rows[0]["value"], 2.0);
    assert_eq!(rows[2]["value"], 1.0);

    let json = plot_json("test/timeseries.csv", "line(x: date, y: humidity, agg: median)");
    assert_eq!(json["title"], "Line Chart: Median of humidity by date");
}

#[test]
fn test_pie_ignores_y() {
    let json = plot_json("test/sales.csv", "pie(x: product, y: sales)");
    assert_eq!(json["series"]["type"], "frequency");
    assert!(json["y_label"].is_null());
    assert_eq!(json["title"], "Pie Chart: Distribution of product");
    let rows = json["series"]["data"].as_array().unwrap();
    assert_eq!(rows[0]["key"], "Widget");
    assert_eq!(rows[0]["value"], 3.0);
    assert_eq!(rows[1]["value"], 3.0);
}

#[test]
fn test_histogram_skips_nulls() {
    let json = plot_json("test/sales.csv", "histogram(x: sales)");
    assert_eq!(json["series"]["type"], "raw");
    assert_eq!(json["series"]["data"].as_array().unwrap().len(), 5);
    assert_eq!(json["y_label"], "Count");
}

#[test]
fn test_ineligible_x_column() {
    let result = plot(&["test/sales.csv", "bar(x: sales, y: units)"]);
    let stderr = result.unwrap_err();
    assert!(stderr.contains("sales"), "Unexpected error: {}", stderr);
    assert!(stderr.contains("x-axis"), "Unexpected error: {}", stderr);
}

#[test]
fn test_ineligible_y_column() {
    let result = plot(&["test/sales.csv", "bar(x: region, y: product)"]);
    let stderr = result.unwrap_err();
    assert!(stderr.contains("y-axis"), "Unexpected error: {}", stderr);
}

#[test]
fn test_histogram_rejects_categorical() {
    let result = plot(&["test/sales.csv", "histogram(x: region)"]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_chart_type() {
    let result = plot(&["test/sales.csv", "scatter(x: region, y: sales)"]);
    let stderr = result.unwrap_err();
    assert!(stderr.contains("scatter"), "Unexpected error: {}", stderr);
}

#[test]
fn test_unknown_aggregation() {
    let result = plot(&["test/sales.csv", "bar(x: region, y: sales, agg: mode)"]);
    let stderr = result.unwrap_err();
    assert!(stderr.contains("mode"), "Unexpected error: {}", stderr);
}

#[test]
fn test_parse_error() {
    let result = plot(&["test/sales.csv", "bar(x: region"]);
    let stderr = result.unwrap_err();
    assert!(stderr.contains("Parse error"), "Unexpected error: {}", stderr);
}

#[test]
fn test_unclassified_column_rejected() {
    let result = plot(&["test/mixed.csv", "pie(x: flag)"]);
    assert!(result.is_err());
}

#[test]
fn test_missing_file() {
    let result = plot(&["test/does_not_exist.csv", "pie(x: region)"]);
    let stderr = result.unwrap_err();
    assert!(stderr.contains("Failed to open"), "Unexpected error: {}", stderr);
}

#[test]
fn test_plot_from_stdin() {
    let csv = fs::read_to_string("test/sales.csv").expect("Failed to read test CSV");
    let output = run_chartsmith(&["plot", "-", "pie(x: region)"], Some(&csv));
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(is_valid_png(&output.stdout));
}

#[test]
fn test_svg_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chart.svg");
    let path_str = path.to_str().unwrap();

    let result = plot(&["test/sales.csv", "bar(x: product, y: sales, agg: mean)", "-o", path_str]);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(result.unwrap().is_empty());

    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn test_render_options() {
    let result = plot(&[
        "test/timeseries.csv",
        "histogram(x: humidity)",
        "--options",
        r#"{"width": 320, "height": 240}"#,
    ]);
    let bytes = result.unwrap();
    assert!(is_valid_png(&bytes));

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
}

#[test]
fn test_invalid_render_options() {
    let result = plot(&["test/sales.csv", "pie(x: region)", "--options", "{\"type\": \"gif\"}"]);
    assert!(result.unwrap_err().contains("Invalid render options"));
}

#[test]
fn test_columns_command() {
    let output = run_chartsmith(&["columns", "test/mixed.csv"], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("id: numeric"));
    assert!(stdout.contains("label: categorical"));
    assert!(stdout.contains("flag: unclassified"));
    assert!(stdout.contains("empty: unclassified"));
    assert!(stdout.contains("X: Not selected, label"));
    assert!(stdout.contains("Y: Not selected, id"));
}

#[test]
fn test_charts_command() {
    let output = run_chartsmith(&["charts"], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for label in ["Bar Chart", "Line Chart", "Pie Chart", "Histogram"] {
        assert!(stdout.contains(label), "Missing {}", label);
    }
}

#[test]
fn test_plot_from_json_dataset() {
    let json = plot_json("test/sales.json", "bar(x: region, y: sales)");
    let rows = json["series"]["data"].as_array().unwrap();
    let keys: Vec<&str> = rows.iter().map(|r| r["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["North", "South", "East"]);
    assert_eq!(rows[0]["value"], 220.5);
}
