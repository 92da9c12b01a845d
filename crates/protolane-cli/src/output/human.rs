//! Human-readable output formatter with colors and styling.

use super::formatter::CompileSummary;
use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use protolane_core::ExtractionReport;
use protolane_core::RelayResponse;
use std::path::Path;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn headline(&self, message: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }

    fn list_files(&self, files: &[String]) {
        for file in files {
            let _ = self.term.write_line(&format!("    {file}"));
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_extraction_result(
        &self,
        output_dir: &Path,
        schema_files: &[String],
        report: &ExtractionReport,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline(&format!("Extracted to {}", output_dir.display()));
        let _ = self
            .term
            .write_line(&format!("  Files written: {}", report.files_written));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", report.directories_created));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));
        let _ = self
            .term
            .write_line(&format!("  Schema files: {}", schema_files.len()));
        self.list_files(schema_files);

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Archive entries: {}", report.entries));
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
        }

        Ok(())
    }

    fn format_compile_result(&self, summary: &CompileSummary<'_>) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.headline(&format!(
            "Descriptor set written: {}",
            summary.output.display()
        ));
        let _ = self.term.write_line(&format!(
            "  Schema files: {}",
            summary.schema_files.len()
        ));
        let _ = self.term.write_line(&format!(
            "  Descriptor size: {}",
            Self::format_size(summary.descriptor_bytes as u64)
        ));

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Input: {}", summary.input.display()));
            self.list_files(summary.schema_files);
        }

        Ok(())
    }

    fn format_relay_result(
        &self,
        response: &RelayResponse,
        saved_to: Option<&Path>,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let status = format!("HTTP {}", response.status);
        if !self.use_colors {
            let _ = self.term.write_line(&status);
        } else if (200..300).contains(&response.status) {
            let _ = self.term.write_line(&format!("{}", style(status).green().bold()));
        } else {
            let _ = self
                .term
                .write_line(&format!("{}", style(status).yellow().bold()));
        }

        for (name, value) in &response.headers {
            let _ = self.term.write_line(&format!("  {name}: {value}"));
        }

        match saved_to {
            Some(path) => {
                let _ = self.term.write_line(&format!(
                    "  Body: {} written to {}",
                    Self::format_size(response.body.len() as u64),
                    path.display()
                ));
            }
            None => match std::str::from_utf8(&response.body) {
                Ok(text) if !text.is_empty() => {
                    let _ = self.term.write_line("");
                    let _ = self.term.write_line(text);
                }
                Ok(_) => {}
                Err(_) => {
                    let _ = self.term.write_line(&format!(
                        "  Body: {} of binary data (use --output to save it)",
                        Self::format_size(response.body.len() as u64)
                    ));
                }
            },
        }

        Ok(())
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("WARNING:").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(HumanFormatter::format_size(512), "512 B");
        assert_eq!(HumanFormatter::format_size(1024), "1.0 KB");
        assert_eq!(HumanFormatter::format_size(1536), "1.5 KB");
        assert_eq!(HumanFormatter::format_size(1024 * 1024), "1.0 MB");
        assert_eq!(HumanFormatter::format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
