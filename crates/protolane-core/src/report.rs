//! Extraction operation reporting.

use std::time::Duration;

/// Statistics about a completed extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Number of entries in the archive index.
    pub entries: usize,

    /// Number of regular files written.
    pub files_written: usize,

    /// Number of directory entries created.
    pub directories_created: usize,

    /// Number of schema files among the written files.
    pub schema_files: usize,

    /// Total bytes written to disk.
    pub bytes_written: u64,

    /// Wall-clock duration of the extraction.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files plus directories materialised on disk.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_written + self.directories_created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_total_items() {
        let report = ExtractionReport {
            files_written: 3,
            directories_created: 2,
            ..ExtractionReport::new()
        };
        assert_eq!(report.total_items(), 5);
        assert_eq!(report.bytes_written, 0);
    }
}
