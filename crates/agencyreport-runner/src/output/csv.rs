//! CSV output writer for report results.

use std::io::Write;

use serde_json::Value;

use super::OutputWriter;
use crate::error::{ReportError, Result};
use crate::runner::ReportResult;

/// CSV output writer configuration.
///
/// The header row is taken from the first row's field names. An empty
/// result produces an empty body, header included.
#[derive(Debug, Clone)]
pub struct CsvWriter {
    /// Whether to include a header row.
    pub include_header: bool,

    /// Field delimiter (default: comma).
    pub delimiter: u8,

    /// Quote character (default: double quote).
    pub quote: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self {
            include_header: true,
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl CsvWriter {
    /// Create a new CSV writer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to include a header row.
    pub fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Set the field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Convert a JSON value to a CSV cell.
fn json_value_to_csv_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .map(json_value_to_csv_string)
            .collect::<Vec<_>>()
            .join(";"),
        Value::Object(_) => value.to_string(),
    }
}

impl OutputWriter for CsvWriter {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn write(&self, result: &ReportResult, output: &mut dyn Write) -> Result<()> {
        let Some(first) = result.rows.first() else {
            return Ok(());
        };
        let headers: Vec<&String> = first.keys().collect();

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .has_headers(false)
            .from_writer(output);

        if self.include_header {
            writer
                .write_record(&headers)
                .map_err(|e| ReportError::output(e.to_string()))?;
        }

        for row in &result.rows {
            let values: Vec<String> = headers
                .iter()
                .map(|h| row.get(*h).map(json_value_to_csv_string).unwrap_or_default())
                .collect();
            writer
                .write_record(&values)
                .map_err(|e| ReportError::output(e.to_string()))?;
        }

        writer
            .flush()
            .map_err(|e| ReportError::output(e.to_string()))?;

        Ok(())
    }
}
