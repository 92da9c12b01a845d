//! Output formatter trait for CLI results.

use anyhow::Result;
use protolane_core::ExtractionReport;
use protolane_core::RelayResponse;
use serde::Serialize;
use std::path::Path;

/// What a compile run produced.
#[derive(Debug)]
pub struct CompileSummary<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub schema_files: &'a [String],
    pub descriptor_bytes: usize,
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format extraction result
    fn format_extraction_result(
        &self,
        output_dir: &Path,
        schema_files: &[String],
        report: &ExtractionReport,
    ) -> Result<()>;

    /// Format compilation result
    fn format_compile_result(&self, summary: &CompileSummary<'_>) -> Result<()>;

    /// Format relay result; `saved_to` is set when the body went to a file
    fn format_relay_result(&self, response: &RelayResponse, saved_to: Option<&Path>)
    -> Result<()>;

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    pub fn warning(operation: impl Into<String>, message: impl Into<String>) -> JsonOutput<()> {
        JsonOutput {
            operation: operation.into(),
            status: Status::Warning,
            data: None,
            error: Some(message.into()),
        }
    }
}
