use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashSet;
use std::fmt;

/// Cell contents treated as missing when inferring column types
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Declared storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Numeric,
    Text,
    Temporal,
    Boolean,
    /// No cell could be read (e.g. an all-empty column)
    Unknown,
}

/// A single cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => {
                if ts.time() == NaiveTime::MIN {
                    write!(f, "{}", ts.format("%Y-%m-%d"))
                } else if ts.nanosecond() != 0 {
                    write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f"))
                } else {
                    write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A named, typed column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: DataType,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data_type,
            values,
        }
    }

    /// Build a column from raw text cells, inferring its type.
    ///
    /// A column is numeric when every present cell parses as a number, temporal when
    /// every present cell parses as a date or datetime, boolean when every present cell
    /// is `true`/`false`, and text otherwise. Missing cells become `Value::Null`.
    pub fn infer<S: AsRef<str>>(name: impl Into<String>, raw: &[S]) -> Self {
        let present: Vec<&str> = raw
            .iter()
            .map(|s| s.as_ref().trim())
            .filter(|s| !is_null_marker(s))
            .collect();

        let data_type = if present.is_empty() {
            DataType::Unknown
        } else if present.iter().all(|s| s.parse::<f64>().is_ok()) {
            DataType::Numeric
        } else if present.iter().all(|s| parse_timestamp(s).is_some()) {
            DataType::Temporal
        } else if present.iter().all(|s| parse_bool(s).is_some()) {
            DataType::Boolean
        } else {
            DataType::Text
        };

        let values = raw
            .iter()
            .map(|cell| {
                let trimmed = cell.as_ref().trim();
                if is_null_marker(trimmed) {
                    return Value::Null;
                }
                // Inference above guarantees these parses succeed for present cells
                match data_type {
                    DataType::Numeric => trimmed.parse().map(Value::Number).unwrap_or(Value::Null),
                    DataType::Temporal => parse_timestamp(trimmed).map(Value::Timestamp).unwrap_or(Value::Null),
                    DataType::Boolean => parse_bool(trimmed).map(Value::Bool).unwrap_or(Value::Null),
                    DataType::Text => Value::Text(cell.as_ref().to_string()),
                    DataType::Unknown => Value::Null,
                }
            })
            .collect();

        Self::new(name, data_type, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An immutable, column-typed table.
///
/// All columns have the same length and column names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            bail!("Dataset requires at least one column");
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name()) {
                bail!("Duplicate column name '{}'", column.name());
            }
        }

        let row_count = columns[0].len();
        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            bail!(
                "Column '{}' has {} values, expected {}",
                bad.name(),
                bad.len(),
                row_count
            );
        }

        Ok(Self { columns, row_count })
    }

    /// Create a Dataset from a header row and text rows, inferring column types
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                bail!(
                    "Row {} has {} fields, expected {}",
                    idx + 1,
                    row.len(),
                    headers.len()
                );
            }
        }

        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(col_idx, name)| {
                let cells: Vec<&str> = rows.iter().map(|r| r[col_idx].as_str()).collect();
                Column::infer(name, &cells)
            })
            .collect();

        Self::new(columns)
    }

    /// Create a Dataset from an array of flat JSON records.
    ///
    /// Field names come from the first record. Missing fields and `null` become
    /// empty cells, so type inference treats them as missing.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let records = match value.as_array() {
            Some(records) if !records.is_empty() => records,
            Some(_) => bail!("JSON array has no records"),
            None => bail!("Expected a JSON array of records"),
        };

        let headers: Vec<String> = json_record(&records[0])?.keys().cloned().collect();

        let rows = records
            .iter()
            .map(|item| {
                let fields = json_record(item)?;
                headers
                    .iter()
                    .map(|name| json_cell(name, fields.get(name)))
                    .collect::<Result<Vec<String>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_rows(headers, rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

fn json_record(item: &JsonValue) -> Result<&JsonMap<String, JsonValue>> {
    item.as_object()
        .ok_or_else(|| anyhow!("Every JSON record must be an object"))
}

fn json_cell(name: &str, value: Option<&JsonValue>) -> Result<String> {
    match value {
        None | Some(JsonValue::Null) => Ok(String::new()),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        Some(JsonValue::Bool(b)) => Ok(b.to_string()),
        Some(_) => bail!("Field '{}' holds a nested value", name),
    }
}

fn is_null_marker(s: &str) -> bool {
    NULL_MARKERS.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_utc());
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_infer_numeric() {
        let col = Column::infer("sales", &["10", "2.5", "-3"]);
        assert_eq!(col.data_type(), DataType::Numeric);
        assert_eq!(col.values()[1], Value::Number(2.5));
    }

    #[test]
    fn test_infer_numeric_with_missing_cells() {
        let col = Column::infer("sales", &["10", "", "NA"]);
        assert_eq!(col.data_type(), DataType::Numeric);
        assert_eq!(col.values(), &[Value::Number(10.0), Value::Null, Value::Null]);
    }

    #[test]
    fn test_infer_temporal() {
        let col = Column::infer("day", &["2024-01-01", "2024-01-02 13:45:00", "2024-02-01T08:00:00"]);
        assert_eq!(col.data_type(), DataType::Temporal);
        assert_eq!(col.values()[0].to_string(), "2024-01-01");
        assert_eq!(col.values()[1].to_string(), "2024-01-02 13:45:00");
    }

    #[test]
    fn test_timestamp_display_keeps_fractional_seconds() {
        let col = Column::infer("ts", &["2024-01-01T10:00:00.250Z", "2024-01-01T10:00:00Z"]);
        assert_eq!(col.data_type(), DataType::Temporal);
        assert_eq!(col.values()[0].to_string(), "2024-01-01 10:00:00.250");
        assert_eq!(col.values()[1].to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn test_infer_text_when_mixed() {
        let col = Column::infer("region", &["North", "12", "2024-01-01"]);
        assert_eq!(col.data_type(), DataType::Text);
        assert_eq!(col.values()[1], Value::Text("12".to_string()));
    }

    #[test]
    fn test_infer_boolean_and_unknown() {
        assert_eq!(Column::infer("flag", &["true", "False"]).data_type(), DataType::Boolean);
        assert_eq!(Column::infer("blank", &["", " "]).data_type(), DataType::Unknown);
    }

    #[test]
    fn test_dataset_rejects_duplicate_names() {
        let result = Dataset::from_rows(strings(&["a", "a"]), vec![strings(&["1", "2"])]);
        assert!(result.unwrap_err().to_string().contains("Duplicate column name"));
    }

    #[test]
    fn test_dataset_rejects_unequal_lengths() {
        let result = Dataset::new(vec![
            Column::infer("a", &["1", "2"]),
            Column::infer("b", &["1"]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_dataset_rejects_ragged_rows() {
        let result = Dataset::from_rows(strings(&["a", "b"]), vec![strings(&["1"])]);
        assert!(result.unwrap_err().to_string().contains("Row 1"));
    }

    #[test]
    fn test_from_json() {
        let value = json!([
            {"region": "North", "sales": 10},
            {"region": "South", "sales": null},
        ]);
        let ds = Dataset::from_json(&value).unwrap();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("sales").unwrap().data_type(), DataType::Numeric);
        assert_eq!(ds.column("region").unwrap().data_type(), DataType::Text);
        assert!(ds.column("sales").unwrap().values()[1].is_null());
    }

    #[test]
    fn test_from_json_rejects_nested_values() {
        let result = Dataset::from_json(&json!([{"a": [1, 2]}]));
        assert!(result.unwrap_err().to_string().contains("nested value"));
        assert!(Dataset::from_json(&json!([])).is_err());
        assert!(Dataset::from_json(&json!([{"a": 1}, 3])).is_err());
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let result = Dataset::from_json(&json!({"a": 1}));
        assert!(result.unwrap_err().to_string().contains("JSON array of records"));
    }
}
