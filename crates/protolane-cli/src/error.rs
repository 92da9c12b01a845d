//! Error conversion utilities for CLI.
//!
//! Converts protolane-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use protolane_core::Error;
use std::path::Path;

/// Converts an extraction or compilation error for `input` into an anyhow
/// error with a hint.
pub fn convert_schema_error(err: Error, input: &Path) -> anyhow::Error {
    let input = input.display();
    match err {
        Error::PathTraversal { path } => anyhow!(
            "Security violation: Archive '{input}' attempted path traversal with '{}'\n\
             HINT: This archive may be malicious. Do not extract from untrusted sources.",
            path.display()
        ),
        Error::TooManyEntries { count, max } => anyhow!(
            "Archive '{input}' has {count} entries (limit {max})\n\
             HINT: Use --max-entries to raise the limit if the archive is trusted."
        ),
        Error::SizeLimitExceeded { total, max } => anyhow!(
            "Security violation: Archive '{input}' expands past {max} bytes (reached {total})\n\
             HINT: Use --max-uncompressed to raise the limit if the archive is trusted."
        ),
        Error::DuplicateEntry { path } => anyhow!(
            "Archive '{input}' writes '{}' more than once\n\
             HINT: Rebuild the archive without duplicate or aliasing entry names.",
            path.display()
        ),
        Error::InvalidArchive(reason) => anyhow!(
            "Invalid archive '{input}': {reason}\n\
             HINT: The archive may be corrupted or not a ZIP file."
        ),
        Error::NoSchemaFiles { .. } => anyhow!(
            "No .proto files found in '{input}'\n\
             HINT: Schema files are matched by a case-insensitive '.proto' suffix."
        ),
        Error::CompilerUnavailable { program, source } => anyhow!(
            "Could not run '{}': {source}\n\
             HINT: Install protoc or point --protoc (or PROTOLANE_PROTOC) at it.",
            program.display()
        ),
        Error::CompilerFailure {
            exit_code,
            diagnostics,
        } => {
            let status =
                exit_code.map_or_else(|| "was terminated".to_string(), |c| format!("exited {c}"));
            anyhow!(
                "protoc {status} while compiling '{input}'\n{}",
                diagnostics.trim_end()
            )
        }
        Error::InvalidOutputName { name } => anyhow!(
            "Invalid descriptor name '{name}'\n\
             HINT: --output-name must be a plain file name without directories."
        ),
        Error::Io(io_err) => anyhow!("I/O error while processing '{input}': {io_err}"),
        other => anyhow::Error::from(other).context(format!("Error processing '{input}'")),
    }
}

/// Converts a relay error for `url` into an anyhow error with a hint.
pub fn convert_relay_error(err: Error, url: &str) -> anyhow::Error {
    match err {
        Error::ForbiddenHost { host, reason } => anyhow!(
            "Security violation: Destination '{host}' is not allowed ({reason})\n\
             HINT: Use --policy open only for trusted local development."
        ),
        Error::InvalidUrl { reason, .. } => anyhow!(
            "Invalid URL '{url}': {reason}\n\
             HINT: Only absolute http:// and https:// URLs are accepted."
        ),
        Error::InvalidHeader { name, reason } => anyhow!(
            "Invalid header '{name}': {reason}\n\
             HINT: Header values must be printable ASCII without line breaks."
        ),
        Error::Transport { message, .. } => anyhow!("Request to '{url}' failed: {message}"),
        other => anyhow::Error::from(other).context(format!("Error relaying to '{url}'")),
    }
}

/// Adds hint context to a schema operation result.
pub fn add_schema_context<T>(result: protolane_core::Result<T>, input: &Path) -> anyhow::Result<T> {
    result.map_err(|e| convert_schema_error(e, input))
}
