//! Output formats for report results.
//!
//! JSON, NDJSON and CSV are serialized here. PDF and Excel are recognised
//! but rendered elsewhere: the runner hands their rows back untouched as
//! [`RenderedReport::Delegated`].

mod csv;
mod json;

pub use csv::CsvWriter;
pub use json::{JsonArrayWriter, NdjsonWriter};

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::runner::ReportResult;

/// Trait for writing report results to a text format.
pub trait OutputWriter: Send + Sync {
    /// Get the MIME content type for this format.
    fn content_type(&self) -> &'static str;

    /// Get the file extension for this format.
    fn file_extension(&self) -> &'static str;

    /// Write the report result to the output.
    fn write(&self, result: &ReportResult, output: &mut dyn Write) -> Result<()>;

    /// Write the report result into a string.
    fn write_to_string(&self, result: &ReportResult) -> Result<String> {
        let mut buf = Vec::new();
        self.write(result, &mut buf)?;
        String::from_utf8(buf).map_err(|e| ReportError::output(e.to_string()))
    }
}

/// Output format enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured rows (JSON array of objects).
    #[default]
    Json,

    /// Newline-delimited JSON.
    Ndjson,

    /// Comma-separated values.
    Csv,

    /// PDF document, rendered externally.
    Pdf,

    /// Excel workbook, rendered externally.
    #[serde(alias = "xlsx")]
    Excel,
}

impl OutputFormat {
    /// Parse an output format from a string.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::UnsupportedFormat`] if the format string is not
    /// recognized.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            "excel" | "xlsx" => Ok(Self::Excel),
            _ => Err(ReportError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Returns `true` for formats this crate does not serialize itself.
    pub fn is_delegated(&self) -> bool {
        matches!(self, Self::Pdf | Self::Excel)
    }

    /// Get the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Csv => "csv",
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }

    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Ndjson => "application/x-ndjson",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Pdf => "application/pdf",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Ndjson => write!(f, "ndjson"),
            Self::Csv => write!(f, "csv"),
            Self::Pdf => write!(f, "pdf"),
            Self::Excel => write!(f, "excel"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A report serialized for delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedReport {
    /// Structured rows, for callers that serialize JSON themselves.
    Rows(ReportResult),

    /// A text body produced by an [`OutputWriter`].
    Text {
        /// MIME type of `body`.
        content_type: &'static str,
        /// Serialized rows.
        body: String,
    },

    /// Rows for a format rendered outside this crate.
    Delegated {
        /// The requested format.
        format: OutputFormat,
        /// Rows to render.
        result: ReportResult,
    },
}

/// Get a writer for the specified format.
///
/// # Errors
///
/// Returns [`ReportError::UnsupportedFormat`] for delegated formats.
pub fn get_writer(format: OutputFormat) -> Result<Box<dyn OutputWriter>> {
    match format {
        OutputFormat::Json => Ok(Box::new(JsonArrayWriter::new())),
        OutputFormat::Ndjson => Ok(Box::new(NdjsonWriter::new())),
        OutputFormat::Csv => Ok(Box::new(CsvWriter::new())),
        OutputFormat::Pdf | OutputFormat::Excel => {
            Err(ReportError::UnsupportedFormat(format.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::parse("CSV").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::parse("jsonl").unwrap(), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("PDF").unwrap(), OutputFormat::Pdf);
        assert_eq!(OutputFormat::parse("xlsx").unwrap(), OutputFormat::Excel);
        assert!(matches!(
            OutputFormat::parse("docx"),
            Err(ReportError::UnsupportedFormat(f)) if f == "docx"
        ));
    }

    #[test]
    fn test_default_is_json() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }

    #[test]
    fn test_output_format_mime_type() {
        assert_eq!(OutputFormat::Csv.mime_type(), "text/csv; charset=utf-8");
        assert_eq!(OutputFormat::Ndjson.mime_type(), "application/x-ndjson");
        assert_eq!(OutputFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!(OutputFormat::Excel.extension(), "xlsx");
    }

    #[test]
    fn test_output_format_serde() {
        let f: OutputFormat = serde_json::from_str("\"xlsx\"").unwrap();
        assert_eq!(f, OutputFormat::Excel);
        assert_eq!(serde_json::to_string(&OutputFormat::Csv).unwrap(), "\"csv\"");
    }

    #[test]
    fn test_get_writer() {
        assert!(get_writer(OutputFormat::Csv).is_ok());
        assert!(get_writer(OutputFormat::Ndjson).is_ok());
        assert!(get_writer(OutputFormat::Json).is_ok());
        assert!(get_writer(OutputFormat::Pdf).is_err());
        assert!(OutputFormat::Excel.is_delegated());
        assert!(!OutputFormat::Csv.is_delegated());
    }
}
