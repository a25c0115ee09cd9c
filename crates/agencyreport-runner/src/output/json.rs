//! JSON array and NDJSON writers for report results.

use std::io::Write;

use super::OutputWriter;
use crate::error::{ReportError, Result};
use crate::runner::ReportResult;

/// NDJSON output writer.
///
/// Writes each row as a JSON object on its own line, keeping null fields.
#[derive(Debug, Clone, Default)]
pub struct NdjsonWriter;

impl NdjsonWriter {
    /// Create a new NDJSON writer.
    pub fn new() -> Self {
        Self
    }
}

impl OutputWriter for NdjsonWriter {
    fn content_type(&self) -> &'static str {
        "application/x-ndjson"
    }

    fn file_extension(&self) -> &'static str {
        "ndjson"
    }

    fn write(&self, result: &ReportResult, output: &mut dyn Write) -> Result<()> {
        for row in &result.rows {
            let line = serde_json::to_string(row).map_err(|e| ReportError::output(e.to_string()))?;
            writeln!(output, "{line}").map_err(|e| ReportError::output(e.to_string()))?;
        }
        Ok(())
    }
}

/// JSON array output writer.
#[derive(Debug, Clone, Default)]
pub struct JsonArrayWriter {
    /// Whether to pretty-print the output.
    pub pretty: bool,
}

impl JsonArrayWriter {
    /// Create a new JSON array writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty-printing.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl OutputWriter for JsonArrayWriter {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn write(&self, result: &ReportResult, output: &mut dyn Write) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *output, &result.rows)
        } else {
            serde_json::to_writer(&mut *output, &result.rows)
        }
        .map_err(|e| ReportError::output(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::Row;
    use serde_json::{Value, json};

    fn sample() -> ReportResult {
        let rows: Vec<Row> = vec![
            [("id".to_string(), json!(1)), ("name".to_string(), json!("Alice"))]
                .into_iter()
                .collect(),
            [("id".to_string(), json!(2)), ("name".to_string(), Value::Null)]
                .into_iter()
                .collect(),
        ];
        ReportResult::from_rows(rows)
    }

    #[test]
    fn test_ndjson_writer() {
        let out = NdjsonWriter::new().write_to_string(&sample()).unwrap();
        assert_eq!(out, "{\"id\":1,\"name\":\"Alice\"}\n{\"id\":2,\"name\":null}\n");
    }

    #[test]
    fn test_json_array_writer_keeps_column_order() {
        let out = JsonArrayWriter::new().write_to_string(&sample()).unwrap();
        assert_eq!(out, r#"[{"id":1,"name":"Alice"},{"id":2,"name":null}]"#);

        let parsed: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_json_array_writer_empty() {
        let out = JsonArrayWriter::new()
            .write_to_string(&ReportResult::default())
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_pretty_json_array() {
        let out = JsonArrayWriter::new()
            .with_pretty(true)
            .write_to_string(&sample())
            .unwrap();
        assert!(out.contains("\n  {"));
    }
}
