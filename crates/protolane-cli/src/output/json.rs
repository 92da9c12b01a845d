//! JSON output formatter for machine-readable results.

use super::formatter::CompileSummary;
use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use protolane_core::ExtractionReport;
use protolane_core::RelayResponse;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(
        &self,
        output_dir: &Path,
        schema_files: &[String],
        report: &ExtractionReport,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput<'a> {
            output_dir: String,
            schema_files: &'a [String],
            entries: usize,
            files_written: usize,
            directories_created: usize,
            bytes_written: u64,
            duration_ms: u128,
        }

        let data = ExtractionOutput {
            output_dir: output_dir.display().to_string(),
            schema_files,
            entries: report.entries,
            files_written: report.files_written,
            directories_created: report.directories_created,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
        };

        Self::output(&JsonOutput::success("extract", data))
    }

    fn format_compile_result(&self, summary: &CompileSummary<'_>) -> Result<()> {
        #[derive(Serialize)]
        struct CompileOutput<'a> {
            input: String,
            output: String,
            schema_files: &'a [String],
            descriptor_bytes: usize,
        }

        let data = CompileOutput {
            input: summary.input.display().to_string(),
            output: summary.output.display().to_string(),
            schema_files: summary.schema_files,
            descriptor_bytes: summary.descriptor_bytes,
        };

        Self::output(&JsonOutput::success("compile", data))
    }

    fn format_relay_result(
        &self,
        response: &RelayResponse,
        saved_to: Option<&Path>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct RelayOutput<'a> {
            status: u16,
            headers: &'a BTreeMap<String, String>,
            body_bytes: usize,
            #[serde(skip_serializing_if = "Option::is_none")]
            body: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            saved_to: Option<String>,
        }

        let data = RelayOutput {
            status: response.status,
            headers: &response.headers,
            body_bytes: response.body.len(),
            body: match saved_to {
                Some(_) => None,
                None => std::str::from_utf8(&response.body).ok(),
            },
            saved_to: saved_to.map(|p| p.display().to_string()),
        };

        Self::output(&JsonOutput::success("relay", data))
    }

    fn format_warning(&self, message: &str) {
        let output = JsonOutput::<()>::warning("warning", message);
        if let Ok(json) = serde_json::to_string_pretty(&output) {
            let _ = writeln!(io::stderr(), "{json}");
        }
    }
}
