//! Subcommand implementations.

pub mod compile;
pub mod completion;
pub mod extract;
pub mod relay;

use crate::cli::LimitArgs;
use anyhow::Context;
use anyhow::Result;
use protolane_core::ExtractionLimits;
use std::path::Path;

impl LimitArgs {
    /// Converts the flags into core extraction limits.
    pub fn to_limits(self) -> Result<ExtractionLimits> {
        let max_entries = usize::try_from(self.max_entries)
            .context("--max-entries does not fit this platform")?;
        Ok(ExtractionLimits::new(max_entries, self.max_uncompressed))
    }
}

/// Reads an archive from disk into memory.
fn read_archive(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read archive '{}'", path.display()))
}
