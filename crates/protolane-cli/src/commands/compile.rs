//! Compile command implementation.
//!
//! A directory input is compiled in place; a ZIP input is extracted into a
//! scratch directory first, which is removed when the command returns.

use super::read_archive;
use crate::cli::CompileArgs;
use crate::error::add_schema_context;
use crate::output::CompileSummary;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use protolane_core::ArchiveExtractor;
use protolane_core::CompilerConfig;
use protolane_core::SchemaCompiler;
use protolane_core::TempScratch;
use protolane_core::discover_schema_files;
use std::sync::Arc;

pub fn execute(args: &CompileArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let compiler = SchemaCompiler::new(&CompilerConfig::new(args.protoc.clone()));

    let (descriptor, schema_files) = if args.input.is_dir() {
        let files = add_schema_context(discover_schema_files(&args.input), &args.input)?;
        let descriptor = add_schema_context(
            compiler.compile_as(&args.input, &args.output_name),
            &args.input,
        )?;
        (descriptor, files)
    } else {
        let archive = read_archive(&args.input)?;
        let extractor = ArchiveExtractor::new(Arc::new(TempScratch::system()));
        let extracted = add_schema_context(
            extractor.extract(&archive, &args.limits.to_limits()?),
            &args.input,
        )?;
        let descriptor = add_schema_context(
            compiler.compile_as(extracted.output_dir(), &args.output_name),
            &args.input,
        )?;
        let files = extracted.schema_files().to_vec();
        if let Err(e) = extracted.close() {
            tracing::warn!(error = %e, "failed to remove scratch directory");
        }
        (descriptor, files)
    };

    std::fs::write(&args.output, descriptor.as_bytes())
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;

    formatter.format_compile_result(&CompileSummary {
        input: &args.input,
        output: &args.output,
        schema_files: &schema_files,
        descriptor_bytes: descriptor.len(),
    })
}
