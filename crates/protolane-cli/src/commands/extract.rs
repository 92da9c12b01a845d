//! Extract command implementation.

use super::read_archive;
use crate::cli::ExtractArgs;
use crate::error::add_schema_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use protolane_core::ArchiveExtractor;
use protolane_core::ScratchSpace;
use protolane_core::TempScratch;
use std::sync::Arc;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let scratch: Arc<dyn ScratchSpace> = match &args.into {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create '{}'", dir.display()))?;
            Arc::new(TempScratch::new(dir))
        }
        None => Arc::new(TempScratch::system()),
    };

    let archive = read_archive(&args.archive)?;
    let extractor = ArchiveExtractor::new(scratch);
    let result = add_schema_context(
        extractor.extract(&archive, &args.limits.to_limits()?),
        &args.archive,
    )?;

    let report = result.report().clone();
    let (output_dir, schema_files) = result.keep();

    formatter.format_extraction_result(&output_dir, &schema_files, &report)?;
    if schema_files.is_empty() {
        formatter.format_warning("archive contains no .proto files");
    }

    Ok(())
}
